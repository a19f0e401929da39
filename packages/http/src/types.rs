use serde::{Deserialize, Serialize};

/// Body field carrying the new file content on PUT.
pub const CONTENT_FIELD: &str = "newText";

/// Form field a browser uses to ask for another method on POST.
pub const METHOD_FIELD: &str = "_method";

/// HTTP methods the server routes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    GET,
    HEAD,
    POST,
    PUT,
    DELETE,
}

impl Method {
    /// Parse a method name case-insensitively, as sent in `_method`.
    pub fn parse(name: &str) -> Option<Method> {
        match name.trim().to_ascii_uppercase().as_str() {
            "GET" => Some(Method::GET),
            "HEAD" => Some(Method::HEAD),
            "POST" => Some(Method::POST),
            "PUT" => Some(Method::PUT),
            "DELETE" => Some(Method::DELETE),
            _ => None,
        }
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::GET => http::Method::GET,
            Method::HEAD => http::Method::HEAD,
            Method::POST => http::Method::POST,
            Method::PUT => http::Method::PUT,
            Method::DELETE => http::Method::DELETE,
        }
    }
}

/// JSON body of a PUT request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EditRequest {
    #[serde(rename = "newText")]
    pub new_text: String,
}

impl EditRequest {
    pub fn new(new_text: impl Into<String>) -> Self {
        Self {
            new_text: new_text.into(),
        }
    }
}

/// A file as read over HTTP
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteFile {
    /// File content, decoded as text
    pub content: String,

    /// `ETag` response header, to send back as `If-Match`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_method_case_insensitive() {
        assert_eq!(Method::parse("put"), Some(Method::PUT));
        assert_eq!(Method::parse("Delete"), Some(Method::DELETE));
        assert_eq!(Method::parse(" DELETE "), Some(Method::DELETE));
        assert_eq!(Method::parse("PATCH"), None);
        assert_eq!(Method::parse(""), None);
    }

    #[test]
    fn method_into_http() {
        let m: http::Method = Method::DELETE.into();
        assert_eq!(m, http::Method::DELETE);
    }

    #[test]
    fn edit_request_field_name() {
        let json = serde_json::to_value(EditRequest::new("hello")).unwrap();
        assert_eq!(json, serde_json::json!({ "newText": "hello" }));
    }

    #[test]
    fn remote_file_omits_missing_etag() {
        let file = RemoteFile {
            content: "x".to_string(),
            etag: None,
        };
        let json = serde_json::to_value(&file).unwrap();
        assert!(json.get("etag").is_none());
    }
}
