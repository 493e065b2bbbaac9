use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use service_core::error::AppError;

use crate::models::Role;
use crate::services::{JwtService, SessionClaims, TokenError};

/// Why a request was denied.
#[derive(Debug)]
pub enum AccessDenied {
    Missing,
    Invalid,
    Expired,
    Forbidden { role: Role },
}

impl From<AccessDenied> for AppError {
    fn from(denied: AccessDenied) -> Self {
        match denied {
            AccessDenied::Missing => {
                AppError::Unauthorized(anyhow::anyhow!("Access denied, no token provided"))
            }
            // Signature and expiry failures are logged apart but answered
            // alike
            AccessDenied::Invalid | AccessDenied::Expired => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid or expired token"))
            }
            AccessDenied::Forbidden { .. } => {
                AppError::Forbidden(anyhow::anyhow!("Access denied, insufficient permissions"))
            }
        }
    }
}

/// Allow/deny decision for a protected operation, pure over the presented
/// token and the declared role requirement.
///
/// An empty `required_roles` admits any authenticated identity. The guard
/// never consults the credential store: the role travels inside the token,
/// so a role change takes effect only once the token is reissued.
pub fn authorize(
    jwt: &JwtService,
    token: Option<&str>,
    required_roles: &[Role],
) -> Result<SessionClaims, AccessDenied> {
    let token = token.ok_or(AccessDenied::Missing)?;

    let claims = jwt.verify(token).map_err(|e| match e {
        TokenError::Expired => AccessDenied::Expired,
        TokenError::Invalid(source) => {
            tracing::debug!(error = %source, "Token signature rejected");
            AccessDenied::Invalid
        }
    })?;

    if !required_roles.is_empty() && !required_roles.contains(&claims.role) {
        return Err(AccessDenied::Forbidden { role: claims.role });
    }

    Ok(claims)
}

/// State for a guarded route group: the verifier plus the roles admitted.
#[derive(Clone)]
pub struct RoleRequirement {
    jwt: JwtService,
    required: Arc<[Role]>,
}

impl RoleRequirement {
    pub fn new(jwt: JwtService, required: Vec<Role>) -> Self {
        Self {
            jwt,
            required: required.into(),
        }
    }

    /// Any authenticated identity, regardless of role.
    pub fn any_authenticated(jwt: JwtService) -> Self {
        Self::new(jwt, Vec::new())
    }
}

/// Middleware enforcing a [`RoleRequirement`] and exposing the verified
/// claims to handlers through request extensions.
pub async fn guard_middleware(
    State(guard): State<RoleRequirement>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers());

    let claims = authorize(&guard.jwt, token, &guard.required).map_err(|denied| {
        tracing::debug!(reason = ?denied, "Request denied");
        AppError::from(denied)
    })?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Extractor to easily get claims in handlers
pub struct AuthUser(pub SessionClaims);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts.extensions.get::<SessionClaims>().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "Auth claims missing from request extensions"
            ))
        })?;

        Ok(AuthUser(claims.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;

    fn jwt(expiry_hours: i64) -> JwtService {
        JwtService::new(&JwtConfig {
            secret: "guard-test-secret-0123456789".to_string(),
            token_expiry_hours: expiry_hours,
        })
        .unwrap()
    }

    #[test]
    fn missing_token_is_denied() {
        let jwt = jwt(24);
        assert!(matches!(
            authorize(&jwt, None, &[]),
            Err(AccessDenied::Missing)
        ));
    }

    #[test]
    fn garbage_token_is_invalid() {
        let jwt = jwt(24);
        assert!(matches!(
            authorize(&jwt, Some("not.a.token"), &[]),
            Err(AccessDenied::Invalid)
        ));
    }

    #[test]
    fn expired_token_is_denied_as_expired() {
        let jwt = jwt(-1);
        let token = jwt.issue("user_123", Role::Farmer).unwrap();
        assert!(matches!(
            authorize(&jwt, Some(&token), &[]),
            Err(AccessDenied::Expired)
        ));
    }

    #[test]
    fn empty_requirement_admits_any_authenticated() {
        let jwt = jwt(24);
        let token = jwt.issue("user_123", Role::Farmer).unwrap();
        let claims = authorize(&jwt, Some(&token), &[]).unwrap();
        assert_eq!(claims.sub, "user_123");
    }

    #[test]
    fn insufficient_role_is_forbidden() {
        let jwt = jwt(24);
        let token = jwt.issue("user_123", Role::Farmer).unwrap();
        assert!(matches!(
            authorize(&jwt, Some(&token), &[Role::Admin]),
            Err(AccessDenied::Forbidden { role: Role::Farmer })
        ));
    }

    #[test]
    fn matching_role_is_allowed() {
        let jwt = jwt(24);
        let token = jwt.issue("user_123", Role::Admin).unwrap();
        let claims = authorize(&jwt, Some(&token), &[Role::Admin, Role::Researcher]).unwrap();
        assert_eq!(claims.role, Role::Admin);
    }
}
