//! Fetched responses.

use http::StatusCode;
use serde::de::DeserializeOwned;
use theme_core::FetchError;

/// A fully read HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// Content type, when the server sent one.
    pub content_type: Option<String>,
    /// The response body as text.
    pub body: String,
}

impl FetchResponse {
    /// Create a response.
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: None,
            body: body.into(),
        }
    }

    /// A `200 OK` response.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Check if the response was successful (2xx status).
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Whether the body is declared as JSON.
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("json"))
    }

    /// Convert a non-2xx response into an error.
    pub fn error_for_status(self, url: &str) -> Result<Self, FetchError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(FetchError::Http {
                status: self.status.as_u16(),
                url: url.to_string(),
            })
        }
    }

    /// Parse the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        serde_json::from_str(&self.body).map_err(|e| FetchError::Body(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_for_status() {
        let resp = FetchResponse::new(StatusCode::BAD_GATEWAY, "");
        let err = resp.error_for_status("/search").unwrap_err();
        assert_eq!(err.status(), Some(502));

        assert!(FetchResponse::ok("<div></div>").error_for_status("/").is_ok());
    }
}
