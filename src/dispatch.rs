//! Operation call → HTTP round trip
//!
//! A [`Dispatcher`] is the single invocation handler behind every contract
//! adapter. Each call runs header merge, request build, transport execution
//! and response mapping on the caller's thread.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use crate::contract::{ContractDescriptor, OperationDescriptor, ReturnKind};
use crate::error::{ConfigError, DispatchError};
use crate::headers::{merge_headers, HeaderSet};
use crate::request::{build_request, header_arguments, EffectiveRequest};
use crate::transport::{Response, Transport};

/// Result of a call, shaped by the operation's declared return kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Response(Response),
    Empty,
}

impl Reply {
    pub fn into_response(self) -> Option<Response> {
        match self {
            Self::Response(resp) => Some(resp),
            Self::Empty => None,
        }
    }
}

/// Shared invocation handler for one client instance.
///
/// Cheap to clone; clones share the instance header state.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

struct Inner {
    contract: String,
    base_url: String,
    contract_headers: HeaderSet,
    instance_headers: RwLock<HeaderSet>,
    operations: HashMap<String, OperationDescriptor>,
    transport: Box<dyn Transport>,
    strict: bool,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("contract", &self.inner.contract)
            .field("base_url", &self.inner.base_url)
            .field("strict", &self.inner.strict)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub(crate) fn new(
        contract: ContractDescriptor,
        base_url: String,
        instance_headers: HeaderSet,
        transport: Box<dyn Transport>,
        strict: bool,
    ) -> Result<Self, ConfigError> {
        let mut operations = HashMap::with_capacity(contract.operations.len());
        for op in contract.operations {
            if operations.contains_key(&op.id) {
                return Err(ConfigError::DuplicateOperation {
                    contract: contract.name,
                    operation: op.id,
                });
            }
            operations.insert(op.id.clone(), op);
        }

        Ok(Self {
            inner: Arc::new(Inner {
                contract: contract.name,
                base_url,
                contract_headers: contract.headers,
                instance_headers: RwLock::new(instance_headers),
                operations,
                transport,
                strict,
            }),
        })
    }

    pub fn contract(&self) -> &str {
        &self.inner.contract
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn operation(&self, id: &str) -> Option<&OperationDescriptor> {
        self.inner.operations.get(id)
    }

    /// Add or replace an instance-level header for all later calls.
    ///
    /// Calls already in flight keep the headers they started with.
    pub fn add_header(&self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.instance_headers.write().insert(name, value);
    }

    /// Snapshot of the instance-level headers.
    pub fn instance_headers(&self) -> HeaderSet {
        self.inner.instance_headers.read().clone()
    }

    /// Build the request `operation` would send, without sending it.
    pub fn prepare(&self, operation: &str, args: &[Value]) -> Result<EffectiveRequest, DispatchError> {
        let op = self.resolve(operation)?;
        self.build(op, args)
    }

    /// Invoke `operation` with positional `args`.
    pub fn invoke(&self, operation: &str, args: &[Value]) -> Result<Reply, DispatchError> {
        let op = self.resolve(operation)?;

        debug!(contract = %self.inner.contract, operation = %op.id, "building request");
        let request = self.build(op, args)?;

        debug!(
            operation = %op.id,
            method = %request.method,
            path = %request.path,
            "executing request"
        );
        let response = self.inner.transport.execute(&self.inner.base_url, &request);

        debug!(
            operation = %op.id,
            status = ?response.status,
            error = ?response.error,
            "mapping response"
        );
        Ok(match op.returns {
            ReturnKind::Response => Reply::Response(response),
            ReturnKind::Unit => Reply::Empty,
        })
    }

    /// Invoke an operation declared to return the raw response.
    pub fn call(&self, operation: &str, args: &[Value]) -> Result<Response, DispatchError> {
        self.invoke(operation, args)?
            .into_response()
            .ok_or_else(|| DispatchError::NoResponse {
                operation: operation.to_string(),
            })
    }

    fn resolve(&self, operation: &str) -> Result<&OperationDescriptor, DispatchError> {
        self.inner
            .operations
            .get(operation)
            .ok_or_else(|| DispatchError::UnknownOperation {
                contract: self.inner.contract.clone(),
                operation: operation.to_string(),
            })
    }

    fn build(&self, op: &OperationDescriptor, args: &[Value]) -> Result<EffectiveRequest, DispatchError> {
        let instance = self.instance_headers();
        let headers = merge_headers(
            &self.inner.contract_headers,
            &instance,
            &op.headers,
            &header_arguments(op, args),
        );
        build_request(op, args, headers, self.inner.strict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{HttpMethod, ParameterBinding};
    use parking_lot::Mutex;
    use serde_json::json;

    /// Records every request and answers with a fixed status.
    #[derive(Clone, Default)]
    struct Recorder {
        seen: Arc<Mutex<Vec<EffectiveRequest>>>,
    }

    impl Transport for Recorder {
        fn execute(&self, _base_url: &str, request: &EffectiveRequest) -> Response {
            self.seen.lock().push(request.clone());
            Response {
                status: Some(204),
                ..Response::default()
            }
        }
    }

    fn contract() -> ContractDescriptor {
        ContractDescriptor::new("Tracing")
            .url("http://localhost")
            .header("X-Trace", "contract")
            .header("Accept", "application/json")
            .operation(
                OperationDescriptor::new("trace", HttpMethod::Get, "/trace")
                    .header("X-Trace", "a")
                    .param(ParameterBinding::header("X-Trace")),
            )
            .operation(
                OperationDescriptor::new("fire", HttpMethod::Post, "/fire")
                    .returns(ReturnKind::Unit),
            )
    }

    fn dispatcher(recorder: &Recorder, strict: bool) -> Dispatcher {
        Dispatcher::new(
            contract(),
            "http://localhost".into(),
            [("Accept", "text/plain")].into_iter().collect(),
            Box::new(recorder.clone()),
            strict,
        )
        .unwrap()
    }

    #[test]
    fn invoke_applies_header_precedence() {
        let recorder = Recorder::default();
        let d = dispatcher(&recorder, false);

        d.invoke("trace", &[json!("b")]).unwrap();

        let seen = recorder.seen.lock();
        assert_eq!(seen[0].headers.get("x-trace"), Some("b"));
        assert_eq!(seen[0].headers.get("accept"), Some("text/plain"));
    }

    #[test]
    fn invoke_null_header_argument_is_empty_not_omitted() {
        let recorder = Recorder::default();
        let d = dispatcher(&recorder, false);

        d.invoke("trace", &[Value::Null]).unwrap();

        assert_eq!(recorder.seen.lock()[0].headers.get("X-Trace"), Some(""));
    }

    #[test]
    fn invoke_maps_return_kind() {
        let recorder = Recorder::default();
        let d = dispatcher(&recorder, false);

        let reply = d.invoke("trace", &[json!("b")]).unwrap();
        assert_eq!(reply.into_response().unwrap().status, Some(204));

        let reply = d.invoke("fire", &[]).unwrap();
        assert_eq!(reply, Reply::Empty);
        assert_eq!(recorder.seen.lock().len(), 2, "unit operations still execute");
    }

    #[test]
    fn call_rejects_unit_operation() {
        let recorder = Recorder::default();
        let d = dispatcher(&recorder, false);

        let err = d.call("fire", &[]).unwrap_err();
        assert!(matches!(err, DispatchError::NoResponse { .. }));
    }

    #[test]
    fn invoke_unknown_operation_fails() {
        let recorder = Recorder::default();
        let d = dispatcher(&recorder, false);

        let err = d.invoke("missing", &[]).unwrap_err();
        assert!(matches!(err, DispatchError::UnknownOperation { ref operation, .. } if operation == "missing"));
        assert!(recorder.seen.lock().is_empty());
    }

    #[test]
    fn add_header_applies_only_to_later_calls() {
        let recorder = Recorder::default();
        let d = dispatcher(&recorder, false);

        d.invoke("fire", &[]).unwrap();
        d.add_header("X-Key", "v");
        d.invoke("fire", &[]).unwrap();

        let seen = recorder.seen.lock();
        assert!(!seen[0].headers.contains("x-key"));
        assert_eq!(seen[1].headers.get("x-key"), Some("v"));
    }

    #[test]
    fn add_header_is_shared_across_clones() {
        let recorder = Recorder::default();
        let d = dispatcher(&recorder, false);
        let clone = d.clone();

        clone.add_header("Authorization", "Bearer t");

        assert_eq!(d.instance_headers().get("authorization"), Some("Bearer t"));
    }

    #[test]
    fn strict_dispatcher_rejects_argument_mismatch_before_sending() {
        let recorder = Recorder::default();
        let d = dispatcher(&recorder, true);

        let err = d.invoke("trace", &[]).unwrap_err();
        assert!(matches!(err, DispatchError::ArgumentCount { .. }));
        assert!(recorder.seen.lock().is_empty());
    }

    #[test]
    fn prepare_does_not_send() {
        let recorder = Recorder::default();
        let d = dispatcher(&recorder, false);

        let req = d.prepare("trace", &[json!("b")]).unwrap();
        assert_eq!(req.path, "/trace");
        assert!(recorder.seen.lock().is_empty());
    }

    #[test]
    fn duplicate_operation_ids_are_rejected() {
        let contract = contract().operation(OperationDescriptor::new(
            "trace",
            HttpMethod::Put,
            "/again",
        ));
        let err = Dispatcher::new(
            contract,
            "http://localhost".into(),
            HeaderSet::new(),
            Box::new(Recorder::default()),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateOperation { ref operation, .. } if operation == "trace"));
    }

    #[test]
    fn dispatcher_is_shareable_across_threads() {
        let recorder = Recorder::default();
        let d = dispatcher(&recorder, false);

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let d = d.clone();
                std::thread::spawn(move || d.invoke("trace", &[json!(i)]).unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(recorder.seen.lock().len(), 4);
    }
}
