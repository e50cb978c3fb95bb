use std::collections::BTreeSet;

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use futures::future::{ready, Ready};
use serde::Serialize;

use crate::auth::claims::TokenClaims;
use crate::error::{AppError, AuthError};

pub const ROLE_USER: &str = "ROLE_USER";

/// Identity reconstructed from a validated token, scoped to one request.
///
/// Inserted into request extensions by the JWT middleware. Extracting it in
/// a handler makes that route require authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedPrincipal {
    pub identity: String,
    pub user_id: i64,
    pub roles: BTreeSet<String>,
}

impl AuthenticatedPrincipal {
    pub fn from_claims(claims: &TokenClaims) -> Self {
        Self {
            identity: claims.sub.clone(),
            user_id: claims.user_id,
            roles: BTreeSet::from([ROLE_USER.to_string()]),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

impl FromRequest for AuthenticatedPrincipal {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthenticatedPrincipal>()
                .cloned()
                .ok_or(AppError::Auth(AuthError::MissingToken)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn principal() -> AuthenticatedPrincipal {
        let claims = TokenClaims::new("blog@example.com", "user@gmail.com", 7, 0, 10);
        AuthenticatedPrincipal::from_claims(&claims)
    }

    #[test]
    fn test_principal_from_claims() {
        let principal = principal();
        assert_eq!(principal.identity, "user@gmail.com");
        assert_eq!(principal.user_id, 7);
        assert!(principal.has_role(ROLE_USER));
        assert!(!principal.has_role("ROLE_ADMIN"));
    }

    #[actix_web::test]
    async fn test_extract_from_extensions() {
        let req = TestRequest::default().to_http_request();
        req.extensions_mut().insert(principal());

        let extracted = AuthenticatedPrincipal::extract(&req).await.unwrap();
        assert_eq!(extracted, principal());
    }

    #[actix_web::test]
    async fn test_missing_principal_is_rejected() {
        let req = TestRequest::default().to_http_request();
        let result = AuthenticatedPrincipal::extract(&req).await;

        assert!(matches!(result, Err(AppError::Auth(AuthError::MissingToken))));
    }
}
