//! Shared-token gate for the management API.
//!
//! Requests carry the token as the `k` query parameter. An empty configured
//! token leaves the API open.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::web::error::ApiError;

/// Token expected by [`require_token`].
#[derive(Debug, Clone)]
pub struct ApiToken(Arc<str>);

impl ApiToken {
    pub fn new(token: &str) -> Self {
        Self(Arc::from(token))
    }

    /// Whether requests must present a token.
    pub fn is_required(&self) -> bool {
        !self.0.is_empty()
    }

    fn matches(&self, presented: &str) -> bool {
        // Constant time in the length of the token.
        let expected = self.0.as_bytes();
        let presented = presented.as_bytes();
        expected.len() == presented.len()
            && expected
                .iter()
                .zip(presented)
                .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                == 0
    }
}

/// Value of the `k` query parameter, form-decoded.
fn token_from_query(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "k")
        .map(|(_, value)| value.into_owned())
}

/// Reject requests whose `k` parameter does not match the configured token.
pub async fn require_token(
    State(token): State<ApiToken>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if token.is_required() {
        let presented = req.uri().query().and_then(token_from_query);
        match presented {
            Some(k) if token.matches(&k) => {}
            Some(_) => {
                tracing::debug!("Rejected API request with wrong token: {}", req.uri().path());
                return ApiError::unauthorized("invalid token").into_response();
            }
            None => return ApiError::unauthorized("missing token").into_response(),
        }
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_from_query() {
        assert_eq!(token_from_query("k=abc"), Some("abc".to_string()));
        assert_eq!(token_from_query("page=1&k=a%20b"), Some("a b".to_string()));
        assert_eq!(token_from_query("k=a+b"), Some("a b".to_string()));
        assert_eq!(token_from_query("k=a%2Bb"), Some("a+b".to_string()));
        assert_eq!(token_from_query("key=abc"), None);
        assert_eq!(token_from_query(""), None);
    }

    #[test]
    fn test_token_matches() {
        let token = ApiToken::new("secret");
        assert!(token.is_required());
        assert!(token.matches("secret"));
        assert!(!token.matches("secreT"));
        assert!(!token.matches("secre"));
        assert!(!ApiToken::new("").is_required());
    }

    mod gate {
        use super::*;
        use axum::{http::StatusCode, middleware, routing::get, Router};
        use http_body_util::BodyExt;
        use tower::util::ServiceExt;

        async fn ok_handler() -> &'static str {
            "OK"
        }

        fn gated(token: &str) -> Router {
            Router::new()
                .route("/api/list", get(ok_handler))
                .layer(middleware::from_fn_with_state(
                    ApiToken::new(token),
                    require_token,
                ))
        }

        async fn call(app: Router, uri: &str) -> (StatusCode, String) {
            let response = app
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            let status = response.status();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            (status, String::from_utf8(bytes.to_vec()).unwrap())
        }

        #[tokio::test]
        async fn test_missing_token_rejected() {
            let (status, body) = call(gated("secret"), "/api/list").await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body, r#"{"err":"missing token"}"#);
        }

        #[tokio::test]
        async fn test_wrong_token_rejected() {
            let (status, body) = call(gated("secret"), "/api/list?k=nope").await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body, r#"{"err":"invalid token"}"#);
        }

        #[tokio::test]
        async fn test_valid_token_passes() {
            let (status, body) = call(gated("secret"), "/api/list?page=2&k=secret").await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, "OK");
        }

        #[tokio::test]
        async fn test_form_encoded_token_passes() {
            let (status, body) = call(gated("two words"), "/api/list?k=two+words").await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, "OK");
        }

        #[tokio::test]
        async fn test_open_when_unconfigured() {
            let (status, _) = call(gated(""), "/api/list").await;
            assert_eq!(status, StatusCode::OK);
        }
    }
}
