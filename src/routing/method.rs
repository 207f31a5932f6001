//! HTTP method enumeration.
//!
//! # Design Decisions
//! - Closed set of four methods so per-method statistics are a total mapping
//! - Parsing is case-insensitive, rendering is canonical uppercase

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Methods a route can be declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// Every supported method, in reporting order.
    pub const ALL: [HttpMethod; 4] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
    ];

    /// Canonical uppercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Lowercase name, as used for OpenAPI operation keys.
    pub fn as_lower(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Delete => "delete",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a method outside the supported set is parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported HTTP method: {0}")]
pub struct UnsupportedMethod(pub String);

impl FromStr for HttpMethod {
    type Err = UnsupportedMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            _ => Err(UnsupportedMethod(s.to_string())),
        }
    }
}

impl TryFrom<&axum::http::Method> for HttpMethod {
    type Error = UnsupportedMethod;

    fn try_from(method: &axum::http::Method) -> Result<Self, Self::Error> {
        method.as_str().parse()
    }
}

impl From<HttpMethod> for axum::http::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => axum::http::Method::GET,
            HttpMethod::Post => axum::http::Method::POST,
            HttpMethod::Put => axum::http::Method::PUT,
            HttpMethod::Delete => axum::http::Method::DELETE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("Post".parse::<HttpMethod>().unwrap(), HttpMethod::Post);
        assert_eq!("DELETE".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
    }

    #[test]
    fn test_unknown_method_rejected() {
        let err = "PATCH".parse::<HttpMethod>().unwrap_err();
        assert_eq!(err, UnsupportedMethod("PATCH".into()));
        assert!("".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn test_axum_conversion() {
        let m = HttpMethod::try_from(&axum::http::Method::PUT).unwrap();
        assert_eq!(m, HttpMethod::Put);
        assert!(HttpMethod::try_from(&axum::http::Method::HEAD).is_err());
        assert_eq!(axum::http::Method::from(HttpMethod::Get), axum::http::Method::GET);
    }

    #[test]
    fn test_serde_uppercase() {
        let json = serde_json::to_string(&HttpMethod::Delete).unwrap();
        assert_eq!(json, "\"DELETE\"");
        let back: HttpMethod = serde_json::from_str("\"POST\"").unwrap();
        assert_eq!(back, HttpMethod::Post);
    }
}
