//! Contract → callable client
//!
//! Resolves the base URL, seeds default headers and binds a typed contract
//! adapter to a fresh [`Dispatcher`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::info;

use crate::contract::{Contract, ContractDescriptor, UrlSource};
use crate::dispatch::Dispatcher;
use crate::error::ConfigError;
use crate::headers::HeaderSet;
use crate::naming::screaming_snake_case;
use crate::transport::{ReqwestTransport, Transport};

/// Looks up the base URL of a contract by name.
pub trait UrlProvider: Send + Sync {
    fn url(&self, contract: &str) -> Option<String>;
}

impl<F> UrlProvider for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn url(&self, contract: &str) -> Option<String> {
        self(contract)
    }
}

/// Reads `<CONTRACT>_URL` from the environment, e.g. `USER_SERVICE_URL`
/// for a contract named `UserService`. Registered as `"env"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvUrlProvider;

impl EnvUrlProvider {
    pub fn variable(contract: &str) -> String {
        format!("{}_URL", screaming_snake_case(contract))
    }

    /// Look up the variable for `contract` through `env`; empty values count as unset.
    pub fn lookup(contract: &str, env: impl FnOnce(&str) -> Option<String>) -> Option<String> {
        env(&Self::variable(contract)).filter(|v| !v.is_empty())
    }
}

impl UrlProvider for EnvUrlProvider {
    fn url(&self, contract: &str) -> Option<String> {
        Self::lookup(contract, |name| std::env::var(name).ok())
    }
}

/// Construction-time options for a client instance.
#[non_exhaustive]
pub struct DriverOptions {
    /// Instance-level default headers, second precedence tier
    pub headers: HeaderSet,
    /// Turn silently skipped arguments into errors
    pub strict: bool,
    providers: HashMap<String, Arc<dyn UrlProvider>>,
    transport: Option<Box<dyn Transport>>,
}

impl Default for DriverOptions {
    fn default() -> Self {
        let mut providers: HashMap<String, Arc<dyn UrlProvider>> = HashMap::new();
        providers.insert("env".to_string(), Arc::new(EnvUrlProvider));
        Self {
            headers: HeaderSet::new(),
            strict: false,
            providers,
            transport: None,
        }
    }
}

impl fmt::Debug for DriverOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut providers: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        providers.sort_unstable();
        f.debug_struct("DriverOptions")
            .field("headers", &self.headers)
            .field("strict", &self.strict)
            .field("providers", &providers)
            .field("custom_transport", &self.transport.is_some())
            .finish()
    }
}

impl DriverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn headers<K, V>(mut self, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.headers.extend(headers);
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Register a provider for contracts that name it as their url provider.
    pub fn url_provider(mut self, name: impl Into<String>, provider: impl UrlProvider + 'static) -> Self {
        self.providers.insert(name.into(), Arc::new(provider));
        self
    }

    /// Replace the default `reqwest` transport.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }
}

/// Resolve the base URL of `contract`: static url first, then its provider.
pub fn resolve_base_url(
    contract: &ContractDescriptor,
    options: &DriverOptions,
) -> Result<String, ConfigError> {
    let missing = || ConfigError::MissingUrl {
        contract: contract.name.clone(),
    };
    let url = match &contract.url {
        UrlSource::Static(url) => Some(url.clone()),
        UrlSource::Provider(provider) => provider.url(&contract.name),
        UrlSource::Named(name) => {
            let provider =
                options
                    .providers
                    .get(name)
                    .ok_or_else(|| ConfigError::UnknownUrlProvider {
                        contract: contract.name.clone(),
                        provider: name.clone(),
                    })?;
            provider.url(&contract.name)
        }
        UrlSource::Unset => None,
    };
    let url = url.ok_or_else(missing)?;
    Ok(url.trim_end_matches('/').to_string())
}

/// Build an untyped dispatcher for `contract`.
pub fn connect(contract: ContractDescriptor, options: DriverOptions) -> Result<Dispatcher, ConfigError> {
    let base_url = resolve_base_url(&contract, &options)?;
    info!(contract = %contract.name, %base_url, "client constructed");

    let transport = options
        .transport
        .unwrap_or_else(|| Box::new(ReqwestTransport::new()));
    Dispatcher::new(contract, base_url, options.headers, transport, options.strict)
}

/// A typed contract bound to its dispatcher.
#[derive(Debug)]
pub struct ApiDriver<C> {
    api: C,
    dispatcher: Dispatcher,
}

impl<C: Contract> ApiDriver<C> {
    pub fn new(options: DriverOptions) -> Result<Self, ConfigError> {
        let dispatcher = connect(C::describe(), options)?;
        Ok(Self {
            api: C::bind(dispatcher.clone()),
            dispatcher,
        })
    }

    pub fn api(&self) -> &C {
        &self.api
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Add a default header to every later call of this client.
    pub fn add_header(&self, name: impl Into<String>, value: impl Into<String>) {
        self.dispatcher.add_header(name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_provider_variable_name() {
        assert_eq!(EnvUrlProvider::variable("UserService"), "USER_SERVICE_URL");
    }

    #[test]
    fn env_provider_looks_up_contract_variable() {
        let env = |name: &str| (name == "BILLING_API_URL").then(|| "http://billing".to_string());
        assert_eq!(
            EnvUrlProvider::lookup("BillingApi", env).as_deref(),
            Some("http://billing")
        );
        assert!(EnvUrlProvider::lookup("Ledger", env).is_none());
    }

    #[test]
    fn env_provider_treats_empty_value_as_unset() {
        assert!(EnvUrlProvider::lookup("BillingApi", |_| Some(String::new())).is_none());
    }

    #[test]
    fn resolve_prefers_static_url_and_trims_slash() {
        let contract = ContractDescriptor::new("A").url("http://a/");
        let url = resolve_base_url(&contract, &DriverOptions::new()).unwrap();
        assert_eq!(url, "http://a");
    }

    #[test]
    fn resolve_uses_inline_provider() {
        let contract = ContractDescriptor::new("A")
            .url_provider(|name: &str| Some(format!("http://{}.internal", name.to_lowercase())));
        let url = resolve_base_url(&contract, &DriverOptions::new()).unwrap();
        assert_eq!(url, "http://a.internal");
    }

    #[test]
    fn resolve_uses_registered_provider() {
        let contract = ContractDescriptor::new("A").named_url_provider("registry");
        let options =
            DriverOptions::new().url_provider("registry", |_: &str| Some("http://r".to_string()));
        assert_eq!(resolve_base_url(&contract, &options).unwrap(), "http://r");
    }

    #[test]
    fn resolve_fails_for_unregistered_provider() {
        let contract = ContractDescriptor::new("A").named_url_provider("nope");
        let err = resolve_base_url(&contract, &DriverOptions::new()).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownUrlProvider { ref provider, .. } if provider == "nope"));
    }

    #[test]
    fn resolve_fails_when_provider_yields_nothing() {
        let contract = ContractDescriptor::new("A").url_provider(|_: &str| -> Option<String> { None });
        let err = resolve_base_url(&contract, &DriverOptions::new()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingUrl { .. }));
    }

    #[test]
    fn resolve_fails_when_registered_provider_yields_nothing() {
        let contract = ContractDescriptor::new("A").named_url_provider("registry");
        let options = DriverOptions::new().url_provider("registry", |_: &str| -> Option<String> { None });
        let err = resolve_base_url(&contract, &options).unwrap_err();
        assert!(matches!(err, ConfigError::MissingUrl { ref contract } if contract == "A"));
    }

    #[test]
    fn connect_fails_without_url() {
        let err = connect(ContractDescriptor::new("A"), DriverOptions::new()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingUrl { ref contract } if contract == "A"));
    }

    #[test]
    fn options_collect_headers_case_insensitively() {
        let options = DriverOptions::new()
            .headers([("X-Key", "1"), ("Accept", "a")])
            .header("x-key", "2")
            .strict(true);
        assert_eq!(options.headers.get("X-KEY"), Some("2"));
        assert_eq!(options.headers.len(), 2);
        assert!(options.strict);
    }
}
