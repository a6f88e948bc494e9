/// Request authentication for post-service
///
/// Tokens are issued elsewhere; this service only verifies HS256 bearer tokens and
/// reads the account id from `sub`. Handlers opt in through the extractors:
/// `ViewerId` rejects unauthenticated requests, `MaybeViewer` downgrades them to an
/// anonymous viewer.
use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::error::ServiceError;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

#[derive(Clone)]
pub struct JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn validate(&self, token: &str) -> Result<Uuid, ServiceError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| ServiceError::Unauthorized(format!("Invalid or expired token: {}", e)))?;

        Uuid::parse_str(&data.claims.sub)
            .map_err(|_| ServiceError::Unauthorized("Invalid user ID in token".to_string()))
    }
}

fn bearer_token(req: &HttpRequest) -> Result<&str, ServiceError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ServiceError::Unauthorized("Missing Authorization header".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ServiceError::Unauthorized("Invalid Authorization scheme".to_string()))
}

fn authenticate(req: &HttpRequest) -> Result<Uuid, ServiceError> {
    let validator = req
        .app_data::<web::Data<JwtValidator>>()
        .ok_or_else(|| ServiceError::Internal(anyhow::anyhow!("JWT validator not configured")))?;

    validator.validate(bearer_token(req)?)
}

/// Authenticated account id. Missing or invalid credentials are a 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerId(pub Uuid);

impl FromRequest for ViewerId {
    type Error = ServiceError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req).map(ViewerId))
    }
}

/// Account id when the request carries a valid token; `None` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaybeViewer(pub Option<Uuid>);

impl FromRequest for MaybeViewer {
    type Error = ServiceError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(MaybeViewer(authenticate(req).ok())))
    }
}
