//! Operation + arguments → effective request
//!
//! Classifies every bound argument by its binding kind and assembles the
//! request that the transport will execute. Building is pure: identical
//! inputs always produce identical requests.

use std::path::PathBuf;

use serde_json::Value;
use tracing::warn;

use crate::contract::{HttpMethod, OperationDescriptor, ParamKind};
use crate::error::DispatchError;
use crate::headers::HeaderSet;

/// A file uploaded under a form field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub field: String,
    pub path: PathBuf,
}

/// Encoded request body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Body {
    #[default]
    Empty,
    /// `k=v&k2=v2`, attached under the declared content type.
    FormUrlEncoded { content_type: String, payload: String },
    /// `multipart/form-data` carrying the attachments plus `fields` as
    /// text parts. `fields` is empty unless a content type was declared.
    Multipart { fields: Vec<(String, String)> },
}

/// Fully specified outbound request for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveRequest {
    pub method: HttpMethod,
    /// Path with `{name}` tokens resolved
    pub path: String,
    pub query: Vec<(String, String)>,
    /// Cookie bindings; already folded into the `cookie` header
    pub cookies: Vec<(String, String)>,
    pub headers: HeaderSet,
    /// Body parameters in declaration order
    pub form: Vec<(String, String)>,
    pub body: Body,
    pub attachments: Vec<Attachment>,
}

impl EffectiveRequest {
    /// Absolute URL: base, resolved path, then the percent-encoded query.
    pub fn url(&self, base_url: &str) -> String {
        let base = base_url.trim_end_matches('/');
        let mut url = if self.path.is_empty() || self.path.starts_with('/') {
            format!("{}{}", base, self.path)
        } else {
            format!("{}/{}", base, self.path)
        };
        if !self.query.is_empty() {
            url.push('?');
            url.push_str(&encode_pairs(&self.query));
        }
        url
    }

    /// The single `cookie` header value: declared cookies, then bindings.
    pub fn cookie_header(&self) -> Option<&str> {
        self.headers.get("cookie")
    }
}

/// Text form of an argument. `Null` is the empty string.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Header-bound arguments, the highest-precedence header scope.
pub fn header_arguments(op: &OperationDescriptor, args: &[Value]) -> Vec<(String, String)> {
    op.parameters
        .iter()
        .enumerate()
        .filter(|(_, binding)| binding.kind == ParamKind::Header)
        .map(|(i, binding)| (binding.name.clone(), stringify(argument(args, i))))
        .collect()
}

/// Build the request for `op` called with `args`, given its merged headers.
///
/// Lenient by default: a non-string `File` argument is skipped and body
/// parameters without a `content-type` header produce no body. With
/// `strict` both cases, and an argument count mismatch, are errors.
pub fn build_request(
    op: &OperationDescriptor,
    args: &[Value],
    mut headers: HeaderSet,
    strict: bool,
) -> Result<EffectiveRequest, DispatchError> {
    if strict && args.len() != op.parameters.len() {
        return Err(DispatchError::ArgumentCount {
            operation: op.id.clone(),
            expected: op.parameters.len(),
            actual: args.len(),
        });
    }

    let mut path = op.path.clone();
    let mut query = Vec::new();
    let mut cookies = Vec::new();
    let mut form = Vec::new();
    let mut attachments = Vec::new();

    for (i, binding) in op.parameters.iter().enumerate() {
        let value = argument(args, i);
        match binding.kind {
            ParamKind::BodyParam => form.push((binding.name.clone(), stringify(value))),
            ParamKind::File => match value {
                Value::String(file) => attachments.push(Attachment {
                    field: binding.name.clone(),
                    path: PathBuf::from(file),
                }),
                _ if strict => {
                    return Err(DispatchError::InvalidFileArgument {
                        operation: op.id.clone(),
                        name: binding.name.clone(),
                    })
                }
                _ => warn!(
                    operation = %op.id,
                    parameter = %binding.name,
                    "skipping file parameter: argument is not a path string"
                ),
            },
            ParamKind::UrlParam => {
                let token = format!("{{{}}}", binding.name);
                path = path.replace(&token, &urlencoding::encode(&stringify(value)));
            }
            ParamKind::QueryParam => query.push((binding.name.clone(), stringify(value))),
            ParamKind::Cookie => cookies.push((binding.name.clone(), stringify(value))),
            // Already folded into `headers` by the merge.
            ParamKind::Header | ParamKind::Unbound => {}
        }
    }

    if !cookies.is_empty() {
        let bound = encode_cookies(&cookies);
        let value = match headers.get("cookie") {
            Some(declared) if !declared.is_empty() => format!("{declared}; {bound}"),
            _ => bound,
        };
        headers.insert("cookie", value);
    }

    let body = build_body(op, &form, &attachments, &headers, strict)?;

    Ok(EffectiveRequest {
        method: op.method,
        path,
        query,
        cookies,
        headers,
        form,
        body,
        attachments,
    })
}

/// Body parameters travel only under a declared `content-type`, as a form
/// payload or, when files are attached, as multipart text parts.
fn build_body(
    op: &OperationDescriptor,
    form: &[(String, String)],
    attachments: &[Attachment],
    headers: &HeaderSet,
    strict: bool,
) -> Result<Body, DispatchError> {
    let content_type = headers.get("content-type");
    if !form.is_empty() && content_type.is_none() {
        if strict {
            return Err(DispatchError::MissingContentType {
                operation: op.id.clone(),
            });
        }
        warn!(
            operation = %op.id,
            "body parameters present without a content-type header; not sent"
        );
    }

    let fields = if content_type.is_some() {
        form.to_vec()
    } else {
        Vec::new()
    };
    if !attachments.is_empty() {
        return Ok(Body::Multipart { fields });
    }
    match content_type {
        Some(content_type) if !fields.is_empty() => Ok(Body::FormUrlEncoded {
            content_type: content_type.to_string(),
            payload: encode_pairs(&fields),
        }),
        _ => Ok(Body::Empty),
    }
}

static NULL: Value = Value::Null;

fn argument(args: &[Value], index: usize) -> &Value {
    args.get(index).unwrap_or(&NULL)
}

fn encode_cookies(cookies: &[(String, String)]) -> String {
    cookies
        .iter()
        .map(|(name, value)| format!("{}={}", name, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("; ")
}

fn encode_pairs(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
