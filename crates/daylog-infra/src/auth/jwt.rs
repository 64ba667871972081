//! Signed session cookies as HS256 JWTs.
//!
//! The session bag is the claim set. There is no `exp`: a session never
//! expires on the server, it is only replaced or cleared.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use daylog_core::domain::Session;
use daylog_core::ports::{AuthError, SessionCodec};

/// Session codec configuration.
#[derive(Debug, Clone)]
pub struct SessionCodecConfig {
    pub secret: String,
    pub issuer: String,
}

/// Claims carried by the session cookie.
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    #[serde(flatten)]
    session: Session,
    iat: i64,    // issued at
    iss: String, // issuer
}

/// JWT-based session codec.
pub struct JwtSessionCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: SessionCodecConfig,
}

impl JwtSessionCodec {
    pub fn new(config: SessionCodecConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["iss"]);
        validation.set_issuer(&[&config.issuer]);

        Self {
            encoding_key,
            decoding_key,
            validation,
            config,
        }
    }
}

impl SessionCodec for JwtSessionCodec {
    fn encode(&self, session: &Session) -> Result<String, AuthError> {
        let claims = SessionClaims {
            session: session.clone(),
            iat: Utc::now().timestamp(),
            iss: self.config.issuer.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Encoding(e.to_string()))
    }

    fn decode(&self, value: &str) -> Result<Session, AuthError> {
        let token_data = decode::<SessionClaims>(value, &self.decoding_key, &self.validation)
            .map_err(|e| AuthError::InvalidSession(e.to_string()))?;

        Ok(token_data.claims.session)
    }
}
