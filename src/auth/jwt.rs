use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    model::employee::EmployeeProfile,
    models::{Claims, TokenType},
};

fn now() -> usize {
    Utc::now().timestamp().max(0) as usize
}

fn claims_for(profile: &EmployeeProfile, token_type: TokenType, ttl: usize) -> Claims {
    Claims {
        user_id: profile.id,
        sub: profile.username.clone(),
        name: profile.display_name.clone(),
        role: profile.role,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
        token_type,
    }
}

fn sign(claims: &Claims, secret: &str) -> AppResult<String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))
}

pub fn generate_access_token(
    profile: &EmployeeProfile,
    secret: &str,
    ttl: usize,
) -> AppResult<String> {
    sign(&claims_for(profile, TokenType::Access, ttl), secret)
}

pub fn generate_refresh_token(
    profile: &EmployeeProfile,
    secret: &str,
    ttl: usize,
) -> AppResult<(String, Claims)> {
    let claims = claims_for(profile, TokenType::Refresh, ttl);
    let token = sign(&claims, secret)?;
    Ok((token, claims))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::profile;

    #[test]
    fn access_token_round_trips() {
        let dina = profile(3, "Dina");
        let token = generate_access_token(&dina, "secret", 60).unwrap();
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.user_id, 3);
        assert_eq!(claims.sub, "dina");
        assert_eq!(claims.name, "Dina");
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let (token, _) = generate_refresh_token(&profile(1, "Rudi"), "secret", 60).unwrap();
        assert!(verify_token(&token, "other").is_err());
    }
}
