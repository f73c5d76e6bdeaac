//! JWT verification middleware: a decode/validate shape collapsed to a
//! single static PEM key since Moose has no JWKS rotation story.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use moose_core::config::AuthConfig;

use crate::error::GatewayError;

/// The verified JWT claims, inserted into request extensions by
/// [`auth_middleware`]. Absent (not just empty) when no public key is
/// configured, or when verification failed and `enforce_auth` is off.
#[derive(Debug, Clone)]
pub struct Jwt(pub serde_json::Value);

pub struct JwtVerifier {
    decoding_key: Option<DecodingKey>,
    issuer: Option<String>,
    audience: Option<String>,
    enforce_auth: bool,
}

impl JwtVerifier {
    pub fn from_config(auth: &AuthConfig) -> Result<Self, jsonwebtoken::errors::Error> {
        let decoding_key = match &auth.jwt_public_key_pem {
            Some(pem) => Some(DecodingKey::from_rsa_pem(pem.as_bytes())?),
            None => None,
        };
        Ok(Self {
            decoding_key,
            issuer: auth.jwt_issuer.clone(),
            audience: auth.jwt_audience.clone(),
            enforce_auth: auth.enforce_auth,
        })
    }

    fn configured(&self) -> bool {
        self.decoding_key.is_some()
    }

    fn validate(&self, token: &str) -> Result<serde_json::Value, jsonwebtoken::errors::Error> {
        let key = self.decoding_key.as_ref().expect("configured() checked by caller");
        let mut validation = Validation::new(Algorithm::RS256);
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }
        if let Some(audience) = &self.audience {
            validation.set_audience(&[audience]);
        } else {
            validation.validate_aud = false;
        }
        let token_data = decode::<serde_json::Value>(token, key, &validation)?;
        Ok(token_data.claims)
    }
}

fn extract_bearer(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Authentication stage of the per-request pipeline. Runs after the health
/// short-circuit and before routing.
pub async fn auth_middleware(
    axum::extract::State(verifier): axum::extract::State<std::sync::Arc<JwtVerifier>>,
    mut request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    if !verifier.configured() {
        return Ok(next.run(request).await);
    }

    let claims = extract_bearer(&request).and_then(|token| verifier.validate(token).ok());

    match claims {
        Some(claims) => {
            request.extensions_mut().insert(Jwt(claims));
        }
        None => {
            if verifier.enforce_auth {
                return Err(GatewayError::Unauthorized("missing or invalid bearer token".into()));
            }
        }
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    const TEST_PRIVATE_KEY: &str = include_str!("../testdata/rsa_private.pem");
    const TEST_PUBLIC_KEY: &str = include_str!("../testdata/rsa_public.pem");

    #[derive(Serialize)]
    struct Claims {
        sub: String,
        iss: String,
        aud: String,
        exp: usize,
    }

    fn make_token(iss: &str, aud: &str) -> String {
        let claims = Claims {
            sub: "user-1".into(),
            iss: iss.into(),
            aud: aud.into(),
            exp: 9_999_999_999,
        };
        encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &EncodingKey::from_rsa_pem(TEST_PRIVATE_KEY.as_bytes()).unwrap(),
        )
        .unwrap()
    }

    fn verifier(issuer: Option<&str>, audience: Option<&str>, enforce: bool) -> JwtVerifier {
        let auth = AuthConfig {
            jwt_public_key_pem: Some(TEST_PUBLIC_KEY.to_string()),
            jwt_issuer: issuer.map(str::to_string),
            jwt_audience: audience.map(str::to_string),
            enforce_auth: enforce,
            ..AuthConfig::default()
        };
        JwtVerifier::from_config(&auth).unwrap()
    }

    #[test]
    fn validates_matching_issuer_and_audience() {
        let v = verifier(Some("moose"), Some("consumption-api"), true);
        let token = make_token("moose", "consumption-api");
        assert!(v.validate(&token).is_ok());
    }

    #[test]
    fn rejects_mismatched_issuer() {
        let v = verifier(Some("moose"), Some("consumption-api"), true);
        let token = make_token("someone-else", "consumption-api");
        assert!(v.validate(&token).is_err());
    }

    #[test]
    fn unconfigured_verifier_skips_entirely() {
        let auth = AuthConfig::default();
        let v = JwtVerifier::from_config(&auth).unwrap();
        assert!(!v.configured());
    }
}
