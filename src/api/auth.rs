use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::{ApiError, AppState};
use crate::db::User;

/// The authenticated owner, attached to the request by `auth_middleware`.
/// Every scoped handler reads it back out of request extensions.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Authentication middleware that checks:
/// 1. `Authorization: Token <token>` header (primary scheme)
/// 2. `Authorization: Bearer <token>` header
/// 3. `X-Api-Key` header
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = extract_token(&headers) else {
        return Err(ApiError::Unauthorized(
            "Authentication credentials were not provided".to_string(),
        ));
    };

    let user = state
        .store()
        .verify_token(&token)
        .await
        .map_err(|e| ApiError::internal(format!("Authentication error: {e}")))?;

    match user {
        Some(user) if user.is_active => {
            tracing::Span::current().record("user_id", user.id);
            request.extensions_mut().insert(CurrentUser(user));
            Ok(next.run(request).await)
        }
        _ => Err(ApiError::Unauthorized("Invalid token".to_string())),
    }
}

/// Extract the auth token from headers
fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
    {
        if let Some(token) = auth_str.strip_prefix("Token ") {
            return Some(token.trim().to_string());
        }
        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            return Some(token.trim().to_string());
        }
    }

    if let Some(api_key) = headers.get("X-Api-Key")
        && let Ok(key_str) = api_key.to_str()
    {
        return Some(key_str.to_string());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_token_schemes() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Token abc123"));
        assert_eq!(extract_token(&headers), Some("abc123".to_string()));

        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Bearer xyz"));
        assert_eq!(extract_token(&headers), Some("xyz".to_string()));

        let mut headers = HeaderMap::new();
        headers.insert("X-Api-Key", HeaderValue::from_static("key"));
        assert_eq!(extract_token(&headers), Some("key".to_string()));

        assert_eq!(extract_token(&HeaderMap::new()), None);
    }
}
