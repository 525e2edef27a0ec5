use actix_web::HttpRequest;

use crate::errors::AppError;

/// Extract the bearer token from the Authorization header.
///
/// Token validation happens upstream (the Teams SSO gateway); here the
/// presence of a token is a precondition, so a missing one is rejected
/// before any work starts.
pub fn require_bearer(request: &HttpRequest) -> Result<String, AppError> {
    request
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim_start_matches("Bearer ").trim().to_string())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            AppError::BadRequest("No access token was found in request header".into())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn missing_or_blank_token_is_rejected() {
        let request = TestRequest::default().to_http_request();
        assert!(require_bearer(&request).is_err());

        let request = TestRequest::default()
            .insert_header(("Authorization", "Bearer   "))
            .to_http_request();
        assert!(require_bearer(&request).is_err());
    }

    #[test]
    fn bearer_prefix_is_stripped() {
        let request = TestRequest::default()
            .insert_header(("Authorization", "Bearer token-123"))
            .to_http_request();
        assert_eq!(require_bearer(&request).unwrap(), "token-123");
    }
}
