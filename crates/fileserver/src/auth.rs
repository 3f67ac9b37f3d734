//! Basic authentication context for incoming requests
//!
//! The middleware never rejects a request. It records whether accounts are
//! configured and which user, if any, presented valid credentials; handlers
//! decide what to do with that.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::state::ServerState;

/// Realm sent with credential challenges
pub const AUTH_REALM: &str = "Basic realm=\"Authorization Required\"";

/// Authorization facts attached to every request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    /// Accounts are configured, so anonymous access may be challenged
    pub required: bool,
    /// Authenticated user name
    pub user: Option<String>,
}

impl AuthContext {
    /// Authorization is required but nobody authenticated
    pub fn is_anonymous(&self) -> bool {
        self.required && self.user.is_none()
    }
}

/// Decode `Authorization: Basic <base64(user:password)>`
fn basic_credentials(request: &Request) -> Option<(String, String)> {
    let header = request.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let encoded = header.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}

/// Compare a presented password with the stored one in constant time
///
/// Both sides are hashed first so the comparison length does not depend on
/// the input.
fn password_matches(expected: &str, given: &str) -> bool {
    let expected = Sha256::digest(expected.as_bytes());
    let given = Sha256::digest(given.as_bytes());
    expected.as_slice().ct_eq(given.as_slice()).into()
}

/// Attach an [`AuthContext`] to the request extensions
pub async fn auth_context(
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Response {
    let accounts = state.accounts();
    let user = basic_credentials(&request).and_then(|(user, password)| {
        match accounts.get(&user) {
            Some(expected) if password_matches(expected, &password) => Some(user),
            _ => {
                tracing::debug!("Rejected credentials for user {}", user);
                None
            }
        }
    });

    request.extensions_mut().insert(AuthContext {
        required: state.auth_required(),
        user,
    });

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with(header: Option<&str>) -> Request {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_basic_credentials() {
        // "user:pa:ss"
        let request = request_with(Some("Basic dXNlcjpwYTpzcw=="));
        assert_eq!(
            basic_credentials(&request),
            Some(("user".to_string(), "pa:ss".to_string()))
        );
    }

    #[test]
    fn test_basic_credentials_invalid() {
        assert_eq!(basic_credentials(&request_with(None)), None);
        assert_eq!(basic_credentials(&request_with(Some("Bearer abc"))), None);
        assert_eq!(basic_credentials(&request_with(Some("Basic !!!"))), None);
        // "nocolon"
        assert_eq!(basic_credentials(&request_with(Some("Basic bm9jb2xvbg=="))), None);
    }

    #[test]
    fn test_password_matches() {
        assert!(password_matches("secret", "secret"));
        assert!(!password_matches("secret", "Secret"));
        assert!(!password_matches("secret", "secret "));
        assert!(!password_matches("secret", ""));
        assert!(password_matches("", ""));
    }

    #[test]
    fn test_is_anonymous() {
        assert!(!AuthContext::default().is_anonymous());
        assert!(AuthContext { required: true, user: None }.is_anonymous());
        assert!(!AuthContext {
            required: true,
            user: Some("admin".to_string())
        }
        .is_anonymous());
    }
}
