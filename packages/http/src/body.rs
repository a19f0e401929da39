//! Request body decoding for PUT and form-override POST.
//!
//! Bodies are accepted as `application/x-www-form-urlencoded` or as JSON
//! (`application/json` and any `+json` subtype). The new content must be a
//! string under the `newText` field.

use http::header::CONTENT_TYPE;
use http::HeaderMap;
use serde_json::Value as JsonValue;

use crate::types::{Method, CONTENT_FIELD, METHOD_FIELD};

/// Why a body was refused before reaching the engine.
#[derive(thiserror::Error, Debug)]
pub enum BodyError {
    #[error("unsupported content type: {content_type}")]
    UnsupportedMediaType { content_type: String },

    #[error("TypeError: qs[newText] must be of type string")]
    ContentNotString,

    #[error("malformed JSON body: {0}")]
    MalformedJson(#[from] serde_json::Error),
}

/// Accepted body encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Form,
    Json,
}

impl BodyKind {
    /// Classify a request by its `Content-Type` header.
    pub fn of(headers: &HeaderMap) -> Result<BodyKind, BodyError> {
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        let essence = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        let subtype = essence.split_once('/').map(|(_, sub)| sub).unwrap_or("");

        if subtype == "x-www-form-urlencoded" {
            Ok(BodyKind::Form)
        } else if essence == "application/json" || subtype.ends_with("+json") {
            Ok(BodyKind::Json)
        } else {
            Err(BodyError::UnsupportedMediaType {
                content_type: content_type.to_string(),
            })
        }
    }
}

/// Decoded form fields, in body order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields(Vec<(String, String)>);

impl FormFields {
    pub fn parse(body: &[u8]) -> FormFields {
        FormFields(
            url::form_urlencoded::parse(body)
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
        )
    }

    /// First value of a field.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Remove every occurrence of a field, returning the first value.
    pub fn take(&mut self, name: &str) -> Option<String> {
        let first = self.get(name).map(str::to_string);
        self.0.retain(|(k, _)| k != name);
        first
    }

    /// Remove `_method` and parse it.
    ///
    /// `None` when the field is absent; `Some(None)` when it names a method
    /// we do not know.
    pub fn take_override(&mut self) -> Option<Option<Method>> {
        self.take(METHOD_FIELD).map(|name| Method::parse(&name))
    }

    pub fn new_text(&self) -> Result<String, BodyError> {
        self.get(CONTENT_FIELD)
            .map(str::to_string)
            .ok_or(BodyError::ContentNotString)
    }
}

/// Extract `newText` from a PUT body.
pub fn new_text(headers: &HeaderMap, body: &[u8]) -> Result<String, BodyError> {
    match BodyKind::of(headers)? {
        BodyKind::Form => FormFields::parse(body).new_text(),
        BodyKind::Json => {
            let value: JsonValue = serde_json::from_slice(body)?;
            match value.get(CONTENT_FIELD) {
                Some(JsonValue::String(text)) => Ok(text.clone()),
                _ => Err(BodyError::ContentNotString),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn headers(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        headers
    }

    #[test]
    fn classify_content_types() {
        assert_eq!(
            BodyKind::of(&headers("application/x-www-form-urlencoded")).unwrap(),
            BodyKind::Form
        );
        assert_eq!(
            BodyKind::of(&headers("application/x-www-form-urlencoded; charset=UTF-8")).unwrap(),
            BodyKind::Form
        );
        assert_eq!(
            BodyKind::of(&headers("application/json")).unwrap(),
            BodyKind::Json
        );
        assert_eq!(
            BodyKind::of(&headers("application/merge-patch+json")).unwrap(),
            BodyKind::Json
        );
        assert!(matches!(
            BodyKind::of(&headers("text/plain")),
            Err(BodyError::UnsupportedMediaType { .. })
        ));
        assert!(matches!(
            BodyKind::of(&HeaderMap::new()),
            Err(BodyError::UnsupportedMediaType { .. })
        ));
    }

    #[test]
    fn new_text_from_form() {
        let text = new_text(
            &headers("application/x-www-form-urlencoded"),
            b"newText=hello+world%21&other=1",
        )
        .unwrap();
        assert_eq!(text, "hello world!");
    }

    #[test]
    fn new_text_from_json() {
        let text = new_text(
            &headers("application/json"),
            br#"{"newText": "line one\nline two"}"#,
        )
        .unwrap();
        assert_eq!(text, "line one\nline two");
    }

    #[test]
    fn empty_new_text_is_allowed() {
        let text = new_text(&headers("application/x-www-form-urlencoded"), b"newText=").unwrap();
        assert_eq!(text, "");
    }

    #[test]
    fn non_string_json_content_rejected() {
        for body in [
            &br#"{"newText": 42}"#[..],
            br#"{"newText": null}"#,
            br#"{"newText": ["a"]}"#,
            br#"{"other": "x"}"#,
            br#""just a string""#,
        ] {
            assert!(matches!(
                new_text(&headers("application/json"), body),
                Err(BodyError::ContentNotString)
            ));
        }
    }

    #[test]
    fn content_not_string_message() {
        assert_eq!(
            BodyError::ContentNotString.to_string(),
            "TypeError: qs[newText] must be of type string"
        );
    }

    #[test]
    fn missing_form_content_rejected() {
        assert!(matches!(
            new_text(&headers("application/x-www-form-urlencoded"), b"newText%5Ba%5D=b"),
            Err(BodyError::ContentNotString)
        ));
    }

    #[test]
    fn malformed_json_rejected() {
        assert!(matches!(
            new_text(&headers("application/json"), b"{not json"),
            Err(BodyError::MalformedJson(_))
        ));
    }

    #[test]
    fn method_override_is_removed() {
        let mut fields = FormFields::parse(b"_method=put&newText=abc");
        assert_eq!(fields.take_override(), Some(Some(Method::PUT)));
        assert_eq!(fields.get(METHOD_FIELD), None);
        assert_eq!(fields.new_text().unwrap(), "abc");
    }

    #[test]
    fn method_override_absent_or_unknown() {
        assert_eq!(FormFields::parse(b"newText=abc").take_override(), None);
        assert_eq!(
            FormFields::parse(b"_method=PATCH").take_override(),
            Some(None)
        );
    }
}
