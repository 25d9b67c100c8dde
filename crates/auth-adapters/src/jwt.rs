//! # JwtTokenService
//!
//! HS256 bearer tokens. Claims: `sub` (user id), `role`, `typ`
//! (`access` | `refresh`), `jti` (revocation key), `iss`, `iat`, `exp`.

use chrono::{DateTime, Duration, Utc};
use domains::{DomainError, Result, Role, TokenClaims, TokenKind, TokenPair, TokenService};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    role: String,
    typ: TokenKind,
    jti: String,
    iss: String,
    iat: i64,
    exp: i64,
}

pub struct JwtTokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["sub", "exp", "iss"]);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            issuer: config.issuer,
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
        }
    }

    fn sign(&self, user_id: Uuid, role: Role, kind: TokenKind, ttl: Duration) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role: role.as_str().to_string(),
            typ: kind,
            jti: Uuid::new_v4().to_string(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(DomainError::internal)
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, user_id: Uuid, role: Role) -> Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.sign(user_id, role, TokenKind::Access, self.access_ttl)?,
            refresh_token: self.sign(user_id, role, TokenKind::Refresh, self.refresh_ttl)?,
            token_type: "Bearer".into(),
            expires_in: self.access_ttl.num_seconds(),
        })
    }

    fn verify(&self, token: &str, expected: TokenKind) -> Result<TokenClaims> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            debug!(error = %e, "token rejected");
            match e.kind() {
                ErrorKind::ExpiredSignature => {
                    DomainError::Unauthorized("token has expired".into())
                }
                _ => DomainError::Unauthorized("invalid token".into()),
            }
        })?;
        let claims = data.claims;

        if claims.typ != expected {
            return Err(DomainError::Unauthorized("wrong token type".into()));
        }
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| DomainError::Unauthorized("invalid token subject".into()))?;
        let role = Role::parse(&claims.role)
            .ok_or_else(|| DomainError::Unauthorized("invalid token role".into()))?;
        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0)
            .ok_or_else(|| DomainError::Unauthorized("invalid token expiry".into()))?;

        Ok(TokenClaims {
            user_id,
            role,
            kind: claims.typ,
            token_id: claims.jti,
            expires_at,
        })
    }
}
