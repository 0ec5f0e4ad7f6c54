//! Stateless bearer tokens: HS256-signed JWTs carrying [`TokenClaims`].

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};

use notes_core::UserId;

use crate::{
    AuthError, ClaimsError, CredentialIssuer, CredentialLocation, CredentialValidator,
    IssuedCredential, Principal, TokenClaims, validate_claims,
};

/// Issues and validates HS256 bearer tokens with one process-wide secret.
///
/// Only `HS256` is accepted on the way in; a token whose header names any
/// other algorithm (or none) is rejected before its claims are looked at.
pub struct Hs256TokenAuthority {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl Hs256TokenAuthority {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        let secret = secret.as_ref();

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry and issuer live in our own claim names; `validate_claims` checks them.
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Sign claims for `user_id` issued at `now`.
    pub fn issue_token(&self, user_id: UserId, now: DateTime<Utc>) -> Result<(String, TokenClaims), AuthError> {
        let claims = TokenClaims::new(user_id, now, self.ttl);
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("token signing failed: {e}")))?;
        Ok((token, claims))
    }

    /// Verify signature and algorithm, then the claims' time window.
    pub fn validate_token(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, AuthError> {
        let data = decode::<TokenClaims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidAlgorithmName => AuthError::InvalidSignature,
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Malformed,
            }
        })?;

        validate_claims(&data.claims, now).map_err(|e| match e {
            ClaimsError::Expired => AuthError::Expired,
            ClaimsError::NotYetValid | ClaimsError::InvalidTimeWindow | ClaimsError::WrongIssuer(_) => {
                AuthError::Malformed
            }
        })?;

        Ok(data.claims)
    }
}

impl CredentialValidator for Hs256TokenAuthority {
    fn location(&self) -> CredentialLocation {
        CredentialLocation::AuthorizationBearer
    }

    fn validate(&self, artifact: &str, now: DateTime<Utc>) -> Result<Principal, AuthError> {
        let claims = self.validate_token(artifact, now)?;
        Ok(Principal::new(claims.user_id, claims.issued_at, claims.expires_at))
    }
}

impl CredentialIssuer for Hs256TokenAuthority {
    fn issue(&self, user_id: UserId, now: DateTime<Utc>) -> Result<IssuedCredential, AuthError> {
        let (token, claims) = self.issue_token(user_id, now)?;
        Ok(IssuedCredential::Bearer {
            token,
            expires_at: claims.expires_at,
        })
    }
}
