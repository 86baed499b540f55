//! Contract metadata → descriptors
//!
//! A contract is a literal table describing one remote API: where it lives,
//! which headers every request carries, and how each operation maps its
//! positional arguments onto an HTTP request. Tables are either built in code
//! or deserialized from JSON.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

use crate::dispatch::Dispatcher;
use crate::driver::UrlProvider;
use crate::error::ConfigError;
use crate::headers::HeaderSet;

/// A typed API contract.
///
/// Implementors are thin adapters: `describe` returns the metadata table and
/// every contract method forwards to [`Dispatcher::invoke`] with its
/// operation id and arguments.
pub trait Contract: Sized {
    fn describe() -> ContractDescriptor;

    fn bind(dispatcher: Dispatcher) -> Self;
}

/// HTTP verb of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            _ => Err(ConfigError::UnsupportedMethod {
                method: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for HttpMethod {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Where a bound argument lands in the outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Header,
    Cookie,
    UrlParam,
    QueryParam,
    BodyParam,
    File,
    /// Never inspected.
    Unbound,
}

/// Positional binding: the binding at index `i` applies to argument `i`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[non_exhaustive]
pub struct ParameterBinding {
    pub kind: ParamKind,
    #[serde(default)]
    pub name: String,
}

impl ParameterBinding {
    pub fn new(kind: ParamKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn unbound() -> Self {
        Self::new(ParamKind::Unbound, "")
    }

    pub fn header(name: impl Into<String>) -> Self {
        Self::new(ParamKind::Header, name)
    }

    pub fn cookie(name: impl Into<String>) -> Self {
        Self::new(ParamKind::Cookie, name)
    }

    pub fn url(name: impl Into<String>) -> Self {
        Self::new(ParamKind::UrlParam, name)
    }

    pub fn query(name: impl Into<String>) -> Self {
        Self::new(ParamKind::QueryParam, name)
    }

    pub fn body(name: impl Into<String>) -> Self {
        Self::new(ParamKind::BodyParam, name)
    }

    pub fn file(name: impl Into<String>) -> Self {
        Self::new(ParamKind::File, name)
    }
}

/// What a call hands back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnKind {
    /// The raw transport response, as-is.
    #[default]
    Response,
    /// Nothing; the response is dropped after execution.
    Unit,
}

/// One callable operation, bound to one HTTP request template.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[non_exhaustive]
pub struct OperationDescriptor {
    /// Operation id the adapter dispatches on (e.g. "get_user")
    pub id: String,
    pub method: HttpMethod,
    /// Path template (e.g. "/users/{userId}")
    pub path: String,
    /// Operation-level headers in declaration order
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    /// Bindings aligned 1:1 with the call arguments
    #[serde(default)]
    pub parameters: Vec<ParameterBinding>,
    #[serde(default)]
    pub returns: ReturnKind,
}

impl OperationDescriptor {
    pub fn new(id: impl Into<String>, method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            method,
            path: path.into(),
            headers: Vec::new(),
            parameters: Vec::new(),
            returns: ReturnKind::Response,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn param(mut self, binding: ParameterBinding) -> Self {
        self.parameters.push(binding);
        self
    }

    pub fn returns(mut self, returns: ReturnKind) -> Self {
        self.returns = returns;
        self
    }
}

/// How the base URL of a contract is obtained.
#[derive(Clone, Default)]
pub enum UrlSource {
    Static(String),
    /// A provider registered on the driver options under this name.
    Named(String),
    Provider(Arc<dyn UrlProvider>),
    #[default]
    Unset,
}

impl fmt::Debug for UrlSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(url) => f.debug_tuple("Static").field(url).finish(),
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Provider(_) => f.write_str("Provider(..)"),
            Self::Unset => f.write_str("Unset"),
        }
    }
}

/// One declared API.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ContractDescriptor {
    pub name: String,
    pub url: UrlSource,
    /// Contract-level default headers, lowest precedence
    pub headers: HeaderSet,
    pub operations: Vec<OperationDescriptor>,
}

impl ContractDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: UrlSource::Unset,
            headers: HeaderSet::new(),
            operations: Vec::new(),
        }
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = UrlSource::Static(url.into());
        self
    }

    pub fn url_provider(mut self, provider: impl UrlProvider + 'static) -> Self {
        self.url = UrlSource::Provider(Arc::new(provider));
        self
    }

    pub fn named_url_provider(mut self, name: impl Into<String>) -> Self {
        self.url = UrlSource::Named(name.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn operation(mut self, operation: OperationDescriptor) -> Self {
        self.operations.push(operation);
        self
    }

    /// Parse a contract table from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let table: ContractTable =
            serde_json::from_str(json).map_err(ConfigError::InvalidContract)?;
        Ok(table.into())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::ContractFileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}

#[derive(Debug, Deserialize)]
struct ContractTable {
    name: String,
    url: Option<String>,
    url_provider: Option<String>,
    #[serde(default)]
    headers: Vec<(String, String)>,
    #[serde(default)]
    operations: Vec<OperationDescriptor>,
}

impl From<ContractTable> for ContractDescriptor {
    fn from(table: ContractTable) -> Self {
        let url = match (table.url, table.url_provider) {
            (Some(url), _) => UrlSource::Static(url),
            (None, Some(provider)) => UrlSource::Named(provider),
            (None, None) => UrlSource::Unset,
        };
        Self {
            name: table.name,
            url,
            headers: table.headers.into_iter().collect(),
            operations: table.operations,
        }
    }
}
