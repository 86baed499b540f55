//! Request execution
//!
//! The transport turns an [`EffectiveRequest`] into a [`Response`]. Failures
//! (connection errors, unreadable bodies, non-2xx statuses) are reported on
//! the response itself, never as an `Err`.

use reqwest::blocking::multipart::Form;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Method;
use tracing::debug;

use crate::contract::HttpMethod;
use crate::request::{Body, EffectiveRequest};

/// Raw outcome of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    /// `None` when no response was received
    pub status: Option<u16>,
    pub headers: Vec<(String, String)>,
    pub body: String,
    /// Transport-level failure description, if any
    pub error: Option<String>,
}

impl Response {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.status.is_some_and(|s| (200..300).contains(&s))
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Executes requests against a base URL.
pub trait Transport: Send + Sync {
    fn execute(&self, base_url: &str, request: &EffectiveRequest) -> Response;
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Head => Method::HEAD,
            HttpMethod::Options => Method::OPTIONS,
        }
    }
}

/// Blocking transport over a shared `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn execute(&self, base_url: &str, request: &EffectiveRequest) -> Response {
        let url = request.url(base_url);
        debug!(method = %request.method, %url, "sending request");

        let mut req = self.client.request(request.method.into(), &url);

        let multipart = matches!(request.body, Body::Multipart { .. });
        for (name, value) in request.headers.iter() {
            // multipart bodies carry their own boundary content type
            if multipart && name == "content-type" {
                continue;
            }
            req = req.header(name, value);
        }

        req = match &request.body {
            Body::Multipart { fields } => match multipart_form(fields, request) {
                Ok(form) => req.multipart(form),
                Err(e) => return Response::failed(format!("failed to attach file: {e}")),
            },
            Body::FormUrlEncoded { payload, .. } => req.body(payload.clone()),
            Body::Empty => req,
        };

        send_request(req)
    }
}

fn multipart_form(fields: &[(String, String)], request: &EffectiveRequest) -> std::io::Result<Form> {
    let mut form = Form::new();
    for (name, value) in fields {
        form = form.text(name.clone(), value.clone());
    }
    for attachment in &request.attachments {
        form = form.file(attachment.field.clone(), &attachment.path)?;
    }
    Ok(form)
}

fn send_request(req: RequestBuilder) -> Response {
    let resp = match req.send() {
        Ok(resp) => resp,
        Err(e) => return Response::failed(format!("HTTP request failed: {e}")),
    };
    let status = resp.status().as_u16();
    let headers = resp
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect();

    match resp.text() {
        Ok(body) => Response {
            status: Some(status),
            headers,
            body,
            error: None,
        },
        Err(e) => Response {
            status: Some(status),
            headers,
            body: String::new(),
            error: Some(format!("failed to read response body: {e}")),
        },
    }
}
