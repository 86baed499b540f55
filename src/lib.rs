//! Call remote HTTP APIs described as declarative contracts.
//!
//! A contract is a metadata table: base URL (or a URL provider), default
//! headers and, per operation, the method, path template, headers and the
//! positional binding of each argument (header, cookie, URL, query, body or
//! file). A [`Dispatcher`] turns every call into a concrete request, sends it
//! through a [`Transport`] and hands back the raw response.
//!
//! # Usage
//!
//! ```no_run
//! use api_driver::{
//!     ApiDriver, Contract, ContractDescriptor, Dispatcher, DispatchError, DriverOptions,
//!     HttpMethod, OperationDescriptor, ParameterBinding, Response,
//! };
//! use serde_json::json;
//!
//! struct Users(Dispatcher);
//!
//! impl Contract for Users {
//!     fn describe() -> ContractDescriptor {
//!         ContractDescriptor::new("Users")
//!             .url("https://api.example.com")
//!             .header("Accept", "application/json")
//!             .operation(
//!                 OperationDescriptor::new("get_user", HttpMethod::Get, "/users/{id}")
//!                     .param(ParameterBinding::url("id")),
//!             )
//!     }
//!
//!     fn bind(dispatcher: Dispatcher) -> Self {
//!         Users(dispatcher)
//!     }
//! }
//!
//! impl Users {
//!     fn get_user(&self, id: u64) -> Result<Response, DispatchError> {
//!         self.0.call("get_user", &[json!(id)])
//!     }
//! }
//!
//! let driver = ApiDriver::<Users>::new(DriverOptions::new()).unwrap();
//! driver.add_header("Authorization", "Bearer token");
//! let response = driver.api().get_user(7).unwrap();
//! println!("{:?} {}", response.status, response.body);
//! ```

pub mod cli;
pub mod contract;
pub mod dispatch;
pub mod driver;
pub mod error;
pub mod headers;
pub mod naming;
pub mod request;
pub mod transport;

pub use contract::{
    Contract, ContractDescriptor, HttpMethod, OperationDescriptor, ParamKind, ParameterBinding,
    ReturnKind, UrlSource,
};
pub use dispatch::{Dispatcher, Reply};
pub use driver::{connect, ApiDriver, DriverOptions, EnvUrlProvider, UrlProvider};
pub use error::{ConfigError, DispatchError};
pub use headers::{merge_headers, HeaderSet};
pub use request::{build_request, Attachment, Body, EffectiveRequest};
pub use transport::{ReqwestTransport, Response, Transport};

// Re-export dependencies for downstream crates
pub use reqwest;
pub use serde_json;
