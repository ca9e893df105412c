//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use http::header::HeaderValue;
use http::{HeaderMap, Method, Uri};

/// An incoming HTTP request.
///
/// Built by the server from the hyper request, or by hand (tests, direct
/// [`Router::handle`](crate::Router::handle) calls) via [`Request::builder`].
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    pub(crate) params: HashMap<String, String>,
}

impl Request {
    pub(crate) fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        Self { method, uri, headers, body, params: HashMap::new() }
    }

    /// Builder for constructing a request by hand.
    pub fn builder() -> RequestBuilder {
        RequestBuilder {
            method: Method::GET,
            uri: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup. Non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// URL path, always starting with `/`.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Raw query string, without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    /// URL scheme.
    ///
    /// Origin-form request targets (the normal case behind a reverse proxy)
    /// carry no scheme, so this falls back to `x-forwarded-proto` — the
    /// proxy terminates TLS and tells us what the client actually spoke —
    /// and finally to `http`.
    pub fn scheme(&self) -> &str {
        self.uri
            .scheme_str()
            .or_else(|| self.header("x-forwarded-proto"))
            .unwrap_or("http")
    }

    /// URL authority (`host[:port]`), falling back to the `host` header for
    /// origin-form targets.
    pub fn authority(&self) -> &str {
        self.uri
            .authority()
            .map(|a| a.as_str())
            .or_else(|| self.header("host"))
            .unwrap_or("localhost")
    }

    /// The full request URL, reconstructed from scheme, authority, path and
    /// query.
    pub fn url(&self) -> String {
        let pq = self
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        format!("{}://{}{}", self.scheme(), self.authority(), pq)
    }
}

/// Fluent builder for [`Request`]. Obtain via [`Request::builder`].
pub struct RequestBuilder {
    method: Method,
    uri: Option<Uri>,
    headers: HeaderMap,
    body: Bytes,
}

impl RequestBuilder {
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the request target. Absolute (`https://example.com/a`) and
    /// origin-form (`/a`) URIs both work.
    ///
    /// # Panics
    ///
    /// Panics if `uri` is not a valid URI.
    pub fn uri(mut self, uri: &str) -> Self {
        self.uri = Some(uri.parse().expect("invalid uri"));
        self
    }

    /// Appends a header.
    ///
    /// # Panics
    ///
    /// Panics if `name` or `value` is not a valid header.
    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.append(
            name,
            HeaderValue::from_str(value).expect("invalid header value"),
        );
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn build(self) -> Request {
        Request::new(
            self.method,
            self.uri.unwrap_or_else(|| Uri::from_static("/")),
            self.headers,
            self.body,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_from_absolute_uri() {
        let req = Request::builder().uri("https://example.com/a?b=1").build();
        assert_eq!(req.scheme(), "https");
        assert_eq!(req.authority(), "example.com");
        assert_eq!(req.url(), "https://example.com/a?b=1");
    }

    #[test]
    fn url_from_origin_form_uses_proxy_headers() {
        let req = Request::builder()
            .uri("/a")
            .header("host", "example.com")
            .header("x-forwarded-proto", "https")
            .build();
        assert_eq!(req.url(), "https://example.com/a");
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = Request::builder()
            .uri("/")
            .header("cookie", "sid=1")
            .build();
        assert_eq!(req.header("Cookie"), Some("sid=1"));
    }
}
