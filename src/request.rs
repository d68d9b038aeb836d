//! Incoming HTTP request type.

use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use serde::de::DeserializeOwned;

/// An incoming HTTP request.
///
/// Every route this service exposes is a `GET`, so the body is never read:
/// all input arrives in the query string. Headers are kept for CORS.
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Option<String>,
    pub(crate) headers: HeaderMap,
}

/// The query string could not be decoded into the handler's parameter type.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct QueryError(String);

impl Request {
    pub(crate) fn from_parts(parts: http::request::Parts) -> Self {
        Self {
            query: parts.uri.query().map(str::to_owned),
            path: parts.uri.path().to_owned(),
            method: parts.method,
            headers: parts.headers,
        }
    }

    /// Builds a request in-process, e.g. for [`Router::oneshot`](crate::Router::oneshot).
    ///
    /// `target` is a path with an optional query string: `/slow?delay=2`.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query.to_owned())),
            None => (target, None),
        };
        Self {
            method,
            path: path.to_owned(),
            query,
            headers: HeaderMap::new(),
        }
    }

    /// Shorthand for `Request::new(Method::GET, target)`.
    pub fn get(target: &str) -> Self {
        Self::new(Method::GET, target)
    }

    /// Adds a header to an in-process request.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn path(&self) -> &str { &self.path }

    /// Case-insensitive header lookup. Non-UTF-8 values are skipped.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Decodes the query string into `T`.
    ///
    /// Missing `Option` fields decode as `None`, as do empty values
    /// (`?delay=`). A value that does not parse as the field's type is an
    /// error naming the offending input.
    pub fn query<T: DeserializeOwned>(&self) -> Result<T, QueryError> {
        serde_html_form::from_str(self.query.as_deref().unwrap_or(""))
            .map_err(|e| QueryError(e.to_string()))
    }
}
