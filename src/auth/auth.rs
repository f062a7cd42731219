use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::{model::role::Role, models::{Claims, TokenType}};
use super::jwt::verify_token;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    /// Matches `employee_name` on this user's attendance events.
    pub display_name: String,
    pub role: Role,
}

impl AuthUser {
    pub fn from_claims(claims: Claims) -> AppResult<Self> {
        if claims.token_type != TokenType::Access {
            return Err(AppError::Unauthorized("Access token required".to_string()));
        }
        Ok(AuthUser {
            user_id: claims.user_id,
            username: claims.sub,
            display_name: claims.name,
            role: claims.role,
        })
    }

    pub fn require_admin(&self) -> AppResult<()> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin only".to_string()))
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Staff may only look at their own records; admins at anyone's.
    pub fn scope_to(&self, employee: Option<String>) -> AppResult<Option<String>> {
        match employee {
            _ if self.is_admin() => Ok(employee),
            None => Ok(Some(self.display_name.clone())),
            Some(name) if name == self.display_name => Ok(Some(name)),
            Some(_) => Err(AppError::Forbidden("Staff can only view their own records".to_string())),
        }
    }
}

pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Already verified by the middleware on protected scopes.
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let token = match bearer_token(req) {
            Some(t) => t,
            None => return ready(Err(AppError::Unauthorized("Missing token".to_string()).into())),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => return ready(Err(AppError::Internal("Config missing".to_string()).into())),
        };

        let claims = match verify_token(token, &config.jwt_secret) {
            Ok(c) => c,
            Err(_) => return ready(Err(AppError::Unauthorized("Invalid token".to_string()).into())),
        };

        ready(AuthUser::from_claims(claims).map_err(Into::into))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            user_id: 1,
            username: "dina".into(),
            display_name: "Dina".into(),
            role,
        }
    }

    #[test]
    fn staff_scope_defaults_to_self() {
        let staff = user(Role::Staff);
        assert_eq!(staff.scope_to(None).unwrap().as_deref(), Some("Dina"));
        assert_eq!(staff.scope_to(Some("Dina".into())).unwrap().as_deref(), Some("Dina"));
        assert!(matches!(staff.scope_to(Some("Rudi".into())), Err(AppError::Forbidden(_))));
        assert!(staff.require_admin().is_err());
    }

    #[test]
    fn admin_scope_is_unrestricted() {
        let admin = user(Role::Admin);
        assert_eq!(admin.scope_to(None).unwrap(), None);
        assert_eq!(admin.scope_to(Some("Rudi".into())).unwrap().as_deref(), Some("Rudi"));
    }
}
