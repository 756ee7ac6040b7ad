use actix_web::dev::Payload;
use actix_web::{http::header, web, FromRequest, HttpRequest};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};

use crate::config::AuthSettings;
use crate::error::ApiError;
use crate::routes::AppState;

/// Claims carried by the identity provider's access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: usize,
}

/// Validates HS256 access tokens issued by the identity provider
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str, audience: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        match audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn from_settings(settings: &AuthSettings) -> Self {
        Self::new(&settings.jwt_secret, settings.audience.as_deref())
    }

    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Rejected access token: {}", e);
                ApiError::Unauthorized("Invalid or expired token".to_string())
            })
    }
}

/// The authenticated caller
///
/// Extracting it requires a valid bearer token. Wrap in `Option` for routes
/// where signing in is optional.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    pub token: String,
}

#[derive(Deserialize)]
struct TokenQuery {
    access_token: Option<String>,
}

/// Bearer header first; `access_token` query parameter for clients such as
/// `EventSource` that cannot set headers
fn bearer_token(req: &HttpRequest) -> Option<String> {
    let from_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string());

    from_header.filter(|t| !t.is_empty()).or_else(|| {
        web::Query::<TokenQuery>::from_query(req.query_string())
            .ok()
            .and_then(|q| q.into_inner().access_token)
            .filter(|t| !t.is_empty())
    })
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthUser, ApiError> {
    let token = bearer_token(req)
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| ApiError::Unauthorized("Authentication is not configured".to_string()))?;

    let claims = state.verifier.verify(&token)?;

    Ok(AuthUser {
        id: claims.sub,
        email: claims.email,
        token,
    })
}
