use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use base64::Engine;
use taskman_shared::Role;
use uuid::Uuid;

use crate::{error::AppError, routes::AppState};

use super::jwt::verify_access_token;

/// The resolved principal. Everything downstream (policy, services,
/// handlers) works off this, never off the raw credential.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub roles: Vec<Role>,
}

impl AuthUser {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Dev-mode identity header takes precedence when enabled.
    if state.config.dev_auth {
        if let Some(token) = request
            .headers()
            .get("X-Auth-Token")
            .and_then(|h| h.to_str().ok())
        {
            let auth_user = parse_identity_token(token).ok_or(AppError::Unauthorized)?;
            request.extensions_mut().insert(auth_user);
            return Ok(next.run(request).await);
        }
    }

    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthorized)?;

    let claims = verify_access_token(token, &state.config.jwt_secret)?;

    let auth_user = AuthUser {
        id: claims.sub,
        email: claims.email,
        roles: claims.roles,
    };

    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Parses the dev-mode header: base64 of `user_id:email:role1,role2`.
fn parse_identity_token(token: &str) -> Option<AuthUser> {
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(token)
        .ok()?;
    let decoded = String::from_utf8(decoded).ok()?;

    let mut parts = decoded.splitn(3, ':');
    let id: Uuid = parts.next()?.parse().ok()?;
    let email = parts.next()?.to_string();
    let roles = parts
        .next()?
        .split(',')
        .filter(|s| !s.is_empty())
        .map(|s| match s.trim() {
            "user" => Some(Role::User),
            "manager" => Some(Role::Manager),
            "admin" => Some(Role::Admin),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;

    Some(AuthUser { id, email, roles })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(raw: &str) -> String {
        base64::engine::general_purpose::STANDARD.encode(raw)
    }

    #[test]
    fn parses_well_formed_identity_token() {
        let id = Uuid::new_v4();
        let token = encode(&format!("{}:alice@example.com:user,manager", id));
        let user = parse_identity_token(&token).unwrap();

        assert_eq!(user.id, id);
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.roles, vec![Role::User, Role::Manager]);
    }

    #[test]
    fn rejects_unknown_role_names() {
        let token = encode(&format!("{}:a@b.c:superuser", Uuid::new_v4()));
        assert!(parse_identity_token(&token).is_none());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_identity_token("not-base64!!").is_none());
        assert!(parse_identity_token(&encode("missing-fields")).is_none());
        assert!(parse_identity_token(&encode("not-a-uuid:a@b.c:user")).is_none());
    }

    #[test]
    fn empty_role_list_is_allowed() {
        let token = encode(&format!("{}:a@b.c:", Uuid::new_v4()));
        let user = parse_identity_token(&token).unwrap();
        assert!(user.roles.is_empty());
    }
}
