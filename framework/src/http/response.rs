use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderName, HeaderValue};
use hyper::StatusCode;

/// HTTP Response builder
///
/// Handlers usually write responses through [`Context`](super::Context); this
/// type is what the context accumulates and what the engine turns into a
/// hyper response.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    status: u16,
    body: String,
    headers: Vec<(String, String)>,
}

impl HttpResponse {
    /// An empty 200 response
    pub fn new() -> Self {
        Self {
            status: 200,
            body: String::new(),
            headers: Vec::new(),
        }
    }

    /// Create a response with a string body
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            headers: vec![(
                "Content-Type".to_string(),
                "text/plain; charset=utf-8".to_string(),
            )],
        }
    }

    /// Create a JSON response from a serde_json::Value
    pub fn json(body: serde_json::Value) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
        }
    }

    /// Set the HTTP status code
    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Add a header to the response
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// The HTTP status code
    pub fn status_code(&self) -> u16 {
        self.status
    }

    /// The response body
    pub fn body(&self) -> &str {
        &self.body
    }

    /// First header value with the given name (case-insensitive)
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Carry over headers from `previous` that this response does not set
    ///
    /// Names this response already sets win; the carried headers keep their
    /// original order and come first.
    pub(crate) fn over(mut self, previous: HttpResponse) -> Self {
        let mut headers: Vec<(String, String)> = previous
            .headers
            .into_iter()
            .filter(|(name, _)| self.header_value(name).is_none())
            .collect();
        headers.append(&mut self.headers);
        self.headers = headers;
        self
    }

    /// Drop the body, keeping status and headers
    pub(crate) fn without_body(mut self) -> Self {
        self.body.clear();
        self
    }

    /// Convert to hyper response
    ///
    /// Invalid status codes become 500; headers that are not valid HTTP are
    /// skipped.
    pub fn into_hyper(self) -> hyper::Response<Full<Bytes>> {
        let mut response = hyper::Response::new(Full::new(Bytes::from(self.body)));
        *response.status_mut() =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        for (name, value) in self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                (Ok(name), Ok(value)) => {
                    response.headers_mut().append(name, value);
                }
                _ => tracing::warn!(header = %name, "skipping invalid response header"),
            }
        }

        response
    }
}

impl Default for HttpResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Auto-convert FrameworkError to HttpResponse
///
/// Produces `{"error": "..."}` with the error's status code.
impl From<crate::error::FrameworkError> for HttpResponse {
    fn from(err: crate::error::FrameworkError) -> HttpResponse {
        let status = err.status_code();
        HttpResponse::json(serde_json::json!({ "error": err.to_string() })).status(status)
    }
}
