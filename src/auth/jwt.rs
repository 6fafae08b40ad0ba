use crate::models::{Claims, TokenType};
use jsonwebtoken::{DecodingKey, Validation, decode};

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

/// Only access tokens may call the API; refresh tokens are for the identity
/// service alone.
pub fn verify_access_token(token: &str, secret: &str) -> Result<Claims, String> {
    let claims = verify_token(token, secret)?;
    if claims.token_type != TokenType::Access {
        return Err("Refresh token cannot be used for API access".to_string());
    }
    Ok(claims)
}
