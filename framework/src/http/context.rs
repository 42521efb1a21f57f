use super::body::{parse_form, parse_json};
use super::response::HttpResponse;
use crate::error::FrameworkError;
use bytes::Bytes;
use http::Extensions;
use hyper::{HeaderMap, Method, Uri};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Per-request context handed to middleware and handlers
///
/// Cloning is cheap; all clones refer to the same request. Handlers read the
/// request through it and write their response into it:
///
/// ```rust,ignore
/// fn show(ctx: Context, users: Arc<UserStore>) {
///     match ctx.param("id").ok().and_then(|id| users.find(id)) {
///         Some(user) => ctx.json(200, &user),
///         None => ctx.text(404, "user not found"),
///     }
/// }
/// ```
#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

struct Inner {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    params: HashMap<String, String>,
    body: Bytes,
    extensions: RwLock<Extensions>,
    response: Mutex<HttpResponse>,
    aborted: AtomicBool,
}

impl Context {
    /// Build a context from request parts and an already collected body
    pub fn new(parts: http::request::Parts, body: Bytes) -> Self {
        Self::with_params(parts, body, HashMap::new())
    }

    /// Build a context carrying matched route parameters
    pub fn with_params(
        parts: http::request::Parts,
        body: Bytes,
        params: HashMap<String, String>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                method: parts.method,
                uri: parts.uri,
                headers: parts.headers,
                params,
                body,
                extensions: RwLock::new(parts.extensions),
                response: Mutex::new(HttpResponse::new()),
                aborted: AtomicBool::new(false),
            }),
        }
    }

    /// Get the request method
    pub fn method(&self) -> &Method {
        &self.inner.method
    }

    /// Get the request path
    pub fn path(&self) -> &str {
        self.inner.uri.path()
    }

    /// Get the request URI
    pub fn uri(&self) -> &Uri {
        &self.inner.uri
    }

    /// Get a route parameter by name (e.g., /users/{id})
    /// Returns Err(FrameworkError::ParamError) if the parameter is missing
    pub fn param(&self, name: &str) -> Result<&str, FrameworkError> {
        self.inner
            .params
            .get(name)
            .map(|s| s.as_str())
            .ok_or_else(|| FrameworkError::param(name))
    }

    /// Get all route parameters
    pub fn params(&self) -> &HashMap<String, String> {
        &self.inner.params
    }

    /// Get a query string value by name
    pub fn query(&self, name: &str) -> Option<String> {
        let query = self.inner.uri.query()?;
        serde_urlencoded::from_str::<Vec<(String, String)>>(query)
            .ok()?
            .into_iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Get a header value by name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get all request headers
    pub fn headers(&self) -> &HeaderMap {
        &self.inner.headers
    }

    /// Get the Content-Type header
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// The raw request body
    pub fn body(&self) -> &Bytes {
        &self.inner.body
    }

    /// Parse the request body as JSON
    pub fn parse_json<T: DeserializeOwned>(&self) -> Result<T, FrameworkError> {
        parse_json(&self.inner.body)
    }

    /// Parse the request body as form-urlencoded
    pub fn parse_form<T: DeserializeOwned>(&self) -> Result<T, FrameworkError> {
        parse_form(&self.inner.body)
    }

    /// Parse the request body based on Content-Type header
    ///
    /// - `application/x-www-form-urlencoded` -> Form parsing
    /// - Otherwise -> JSON parsing (default)
    pub fn input<T: DeserializeOwned>(&self) -> Result<T, FrameworkError> {
        match self.content_type() {
            Some(ct) if ct.starts_with("application/x-www-form-urlencoded") => self.parse_form(),
            _ => self.parse_json(),
        }
    }

    /// Store a typed value for later middleware and handlers
    pub fn insert<T: Clone + Send + Sync + 'static>(&self, value: T) {
        self.inner
            .extensions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(value);
    }

    /// Get a typed value stored with [`insert`](Self::insert)
    pub fn get<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        self.inner
            .extensions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get::<T>()
            .cloned()
    }

    /// Write a plain text response
    pub fn text(&self, status: u16, body: impl Into<String>) {
        self.respond(HttpResponse::text(body).status(status));
    }

    /// Write a JSON response
    ///
    /// Serialization failures produce a 500 error response instead.
    pub fn json<T: Serialize + ?Sized>(&self, status: u16, body: &T) {
        match serde_json::to_value(body) {
            Ok(value) => self.respond(HttpResponse::json(value).status(status)),
            Err(e) => self.fail(FrameworkError::internal(format!(
                "Failed to serialize response: {}",
                e
            ))),
        }
    }

    /// Set the response status code, keeping body and headers
    pub fn status(&self, status: u16) {
        let mut response = self.response();
        *response = std::mem::take(&mut *response).status(status);
    }

    /// Add a response header
    pub fn set_header(&self, name: impl Into<String>, value: impl Into<String>) {
        let mut response = self.response();
        *response = std::mem::take(&mut *response).header(name, value);
    }

    /// Write the response
    ///
    /// Status and body are replaced. Headers set earlier, for example by a
    /// middleware, are kept unless `response` sets the same name.
    pub fn respond(&self, response: HttpResponse) {
        let mut current = self.response();
        let previous = std::mem::take(&mut *current);
        *current = response.over(previous);
    }

    /// Write an error response derived from `err`
    pub fn fail(&self, err: FrameworkError) {
        self.respond(HttpResponse::from(err));
    }

    /// Stop the middleware chain; the handler will not run
    pub fn abort(&self) {
        self.inner.aborted.store(true, Ordering::SeqCst);
    }

    /// Write an error response and abort
    pub fn abort_with(&self, err: FrameworkError) {
        self.fail(err);
        self.abort();
    }

    /// Whether the chain was aborted
    pub fn is_aborted(&self) -> bool {
        self.inner.aborted.load(Ordering::SeqCst)
    }

    /// Snapshot of the response written so far
    pub fn response_snapshot(&self) -> HttpResponse {
        self.response().clone()
    }

    /// Take the written response, leaving an empty 200 in its place
    pub(crate) fn take_response(&self) -> HttpResponse {
        std::mem::take(&mut *self.response())
    }

    fn response(&self) -> std::sync::MutexGuard<'_, HttpResponse> {
        self.inner
            .response
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("method", &self.inner.method)
            .field("uri", &self.inner.uri)
            .field("params", &self.inner.params)
            .field("aborted", &self.is_aborted())
            .finish()
    }
}
