use crate::{encoding::encode_query, error::TransportError};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// The resolved body of a request, after the conflict check.
#[derive(Debug, PartialEq)]
pub enum RequestBody<'a> {
    Empty,
    Json(&'a Value),
    Form(&'a [(String, String)]),
}

/// One upstream HTTP request, fully described before any bytes are sent.
///
/// Query parameters are kept as ordered pairs and only encoded at URL
/// construction time, through the grammar-preserving encoder.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    json_body: Option<Value>,
    form_body: Option<Vec<(String, String)>>,
}

impl ApiRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            params: Vec::new(),
            headers: Vec::new(),
            json_body: None,
            form_body: None,
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.json_body = Some(body);
        self
    }

    pub fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.form_body = Some(fields);
        self
    }

    /// Resolves the body, rejecting conflicting instructions.
    pub fn body(&self) -> Result<RequestBody<'_>, TransportError> {
        match (&self.json_body, &self.form_body) {
            (Some(_), Some(_)) => Err(TransportError::ConflictingRequestBody),
            (Some(json), None) => Ok(RequestBody::Json(json)),
            (None, Some(form)) => Ok(RequestBody::Form(form)),
            (None, None) => Ok(RequestBody::Empty),
        }
    }

    /// URL with the encoded query baked in.
    pub fn full_url(&self) -> String {
        if self.params.is_empty() {
            self.url.clone()
        } else {
            format!("{}?{}", self.url, encode_query(&self.params))
        }
    }
}
