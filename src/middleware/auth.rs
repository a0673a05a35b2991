use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::Claims;
use crate::error::ApiError;
use crate::state::AppState;

/// Bearer authentication middleware. Verifies the token and injects the
/// decoded claims into request extensions; handlers extract them with
/// `Extension<Claims>`. Runs before any role check or database access.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())?;
    let claims = state.tokens.verify(&token)?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Extract the bearer token from the Authorization header. Anything short
/// of a well-formed `Bearer <token>` header is reported as a missing
/// token; verification failures are a separate 401 code.
fn bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(ApiError::MissingToken)?;

    let value = header.to_str().map_err(|_| ApiError::MissingToken)?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(ApiError::MissingToken),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::AUTHORIZATION;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value.parse().unwrap());
        headers
    }

    #[test]
    fn no_header_is_missing_token() {
        let err = bearer_token(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.error_code(), "MISSING_TOKEN");
    }

    #[test]
    fn non_bearer_scheme_is_missing_token() {
        let err = bearer_token(&headers_with("Basic dXNlcjpwYXNz")).unwrap_err();
        assert_eq!(err.error_code(), "MISSING_TOKEN");
    }

    #[test]
    fn empty_bearer_is_missing_token() {
        assert!(bearer_token(&headers_with("Bearer ")).is_err());
        assert!(bearer_token(&headers_with("Bearer    ")).is_err());
    }

    #[test]
    fn well_formed_bearer_is_extracted() {
        let token = bearer_token(&headers_with("Bearer abc.def.ghi")).unwrap();
        assert_eq!(token, "abc.def.ghi");
    }
}
