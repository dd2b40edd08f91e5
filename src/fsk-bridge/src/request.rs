//! Pseudo-HTTP request encoding.
//!
//! A Request Artifact is a single text blob:
//!
//! ```text
//! METHOD PATH HTTP/1.1\r\n\r\n<body>
//! ```
//!
//! There are no headers. Navigation produces a bodiless `GET`, API calls a
//! `POST` carrying the caller's body verbatim.

use crate::defaults::HTTP_VERSION;
use crate::{BridgeError, Result};

const HEAD_TERMINATOR: &str = "\r\n\r\n";

/// Request method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
    Other(String),
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Patch => "PATCH",
            Method::Other(m) => m,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_uppercase();
        Ok(match upper.as_str() {
            "GET" => Method::Get,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            "HEAD" => Method::Head,
            "OPTIONS" => Method::Options,
            "PATCH" => Method::Patch,
            "" => return Err(BridgeError::InvalidRequest("empty method".to_string())),
            _ if upper.chars().all(|c| c.is_ascii_alphabetic()) => Method::Other(upper),
            _ => return Err(BridgeError::InvalidRequest(format!("bad method: {s}"))),
        })
    }
}

/// A request crossing the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub body: String,
}

impl Request {
    /// Navigation request for `path`.
    pub fn get(path: impl Into<String>) -> Result<Self> {
        Self::new(Method::Get, path, String::new())
    }

    /// API request carrying `body`.
    pub fn post(path: impl Into<String>, body: impl Into<String>) -> Result<Self> {
        Self::new(Method::Post, path, body)
    }

    /// Build a request. The path only has to be present; its shape is not checked.
    pub fn new(method: Method, path: impl Into<String>, body: impl Into<String>) -> Result<Self> {
        let path = path.into();
        if path.is_empty() {
            return Err(BridgeError::InvalidRequest("empty path".to_string()));
        }
        Ok(Self {
            method,
            path,
            body: body.into(),
        })
    }

    /// Serialize to the artifact text.
    pub fn encode(&self) -> String {
        format!(
            "{} {} {}{}{}",
            self.method, self.path, HTTP_VERSION, HEAD_TERMINATOR, self.body
        )
    }

    /// Parse artifact text, as the runtime side does.
    ///
    /// A bare request line with no terminator parses with an empty body.
    pub fn parse(raw: &str) -> Result<Self> {
        let (head, body) = match raw.split_once(HEAD_TERMINATOR) {
            Some((head, body)) => (head, body),
            None => (raw.trim_end_matches(['\r', '\n']), ""),
        };
        let request_line = head.split("\r\n").next().unwrap_or_default();

        let mut parts = request_line.split_whitespace();
        let method = parts
            .next()
            .ok_or_else(|| BridgeError::InvalidRequest("missing request line".to_string()))?
            .parse::<Method>()?;
        let path = parts
            .next()
            .ok_or_else(|| BridgeError::InvalidRequest("missing path".to_string()))?;
        if let Some(version) = parts.next()
            && !version.starts_with("HTTP/")
        {
            return Err(BridgeError::InvalidRequest(format!(
                "bad version: {version}"
            )));
        }

        Self::new(method, path, body)
    }
}

impl std::fmt::Display for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}
