use crate::error::ApiError;
use reqwest::header::{HeaderMap, HeaderValue};

/// Header api-sports expects the account key in.
pub const API_KEY_HEADER: &str = "x-apisports-key";

/// Builds the default headers sent with every request.
///
/// The key is marked sensitive so it never shows up in debug output.
pub fn auth_headers(api_key: &str) -> Result<HeaderMap, ApiError> {
    if api_key.trim().is_empty() {
        return Err(ApiError::Configuration("football API key is empty".to_string()));
    }
    let mut value = HeaderValue::from_str(api_key.trim())
        .map_err(|e| ApiError::Configuration(format!("football API key is not a valid header: {e}")))?;
    value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(API_KEY_HEADER, value);
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_is_a_configuration_error() {
        assert!(matches!(auth_headers("  "), Err(ApiError::Configuration(_))));
    }

    #[test]
    fn key_is_sensitive() {
        let headers = auth_headers("abc123").unwrap();
        let value = headers.get(API_KEY_HEADER).unwrap();
        assert!(value.is_sensitive());
        assert_eq!(value, "abc123");
    }
}
