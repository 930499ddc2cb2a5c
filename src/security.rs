use crate::error::ApiError;
use axum::http::HeaderMap;
use subtle::ConstantTimeEq;

/// Header carrying the admin API key.
pub const ADMIN_KEY_HEADER: &str = "x-api-key";

/// Constant-time string comparison for secrets.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Check the admin key on a request. With no key configured the admin
/// routes are closed.
pub fn require_admin_key(headers: &HeaderMap, expected: Option<&str>) -> Result<(), ApiError> {
    let Some(expected) = expected.filter(|key| !key.is_empty()) else {
        return Err(ApiError::Unauthorized);
    };

    let provided = headers
        .get(ADMIN_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    if constant_time_compare(provided, expected) {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}
