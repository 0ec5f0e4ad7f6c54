use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use notes_core::UserId;

/// Issuer stamped into (and required from) every bearer token.
pub const TOKEN_ISSUER: &str = "notes-api";

/// Tolerated clock skew for `issued_at` in the future.
const MAX_CLOCK_SKEW: Duration = Duration::seconds(60);

/// Bearer token claims (transport-agnostic).
///
/// Timestamps travel as unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub user_id: UserId,

    #[serde(with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,

    pub issuer: String,
}

impl TokenClaims {
    pub fn new(user_id: UserId, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            user_id,
            issued_at,
            expires_at: issued_at + ttl,
            issuer: TOKEN_ISSUER.to_string(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClaimsError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,

    #[error("unexpected token issuer '{0}'")]
    WrongIssuer(String),
}

/// Deterministically validate token claims.
///
/// Note: this validates the *claims* only. Signature verification happens in
/// [`Hs256TokenAuthority`](crate::Hs256TokenAuthority) before this is called.
pub fn validate_claims(claims: &TokenClaims, now: DateTime<Utc>) -> Result<(), ClaimsError> {
    if claims.issuer != TOKEN_ISSUER {
        return Err(ClaimsError::WrongIssuer(claims.issuer.clone()));
    }
    if claims.expires_at <= claims.issued_at {
        return Err(ClaimsError::InvalidTimeWindow);
    }
    if now + MAX_CLOCK_SKEW < claims.issued_at {
        return Err(ClaimsError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(ClaimsError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn fresh_claims_are_valid() {
        let claims = TokenClaims::new(UserId::new(), t0(), Duration::hours(24));
        assert_eq!(validate_claims(&claims, t0() + Duration::hours(1)), Ok(()));
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let claims = TokenClaims::new(UserId::new(), t0(), Duration::hours(24));
        assert_eq!(
            validate_claims(&claims, t0() + Duration::hours(24)),
            Err(ClaimsError::Expired)
        );
    }

    #[test]
    fn wrong_issuer_rejected() {
        let mut claims = TokenClaims::new(UserId::new(), t0(), Duration::hours(1));
        claims.issuer = "someone-else".to_string();
        assert!(matches!(
            validate_claims(&claims, t0()),
            Err(ClaimsError::WrongIssuer(_))
        ));
    }

    #[test]
    fn future_issue_time_rejected() {
        let claims = TokenClaims::new(UserId::new(), t0() + Duration::minutes(10), Duration::hours(1));
        assert_eq!(validate_claims(&claims, t0()), Err(ClaimsError::NotYetValid));
    }

    #[test]
    fn inverted_window_rejected() {
        let mut claims = TokenClaims::new(UserId::new(), t0(), Duration::hours(1));
        claims.expires_at = claims.issued_at;
        assert_eq!(validate_claims(&claims, t0()), Err(ClaimsError::InvalidTimeWindow));
    }

    #[test]
    fn timestamps_serialize_as_unix_seconds() {
        let claims = TokenClaims::new(UserId::new(), t0(), Duration::hours(24));
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["issued_at"], t0().timestamp());
        assert_eq!(json["expires_at"], t0().timestamp() + 86_400);
        assert_eq!(json["issuer"], "notes-api");
    }

    proptest! {
        /// Property: any instant at or after `expires_at` is rejected as expired.
        #[test]
        fn never_valid_after_expiry(ttl_secs in 1i64..=172_800, late_by in 0i64..=10_000_000) {
            let claims = TokenClaims::new(UserId::new(), t0(), Duration::seconds(ttl_secs));
            let now = claims.expires_at + Duration::seconds(late_by);
            prop_assert_eq!(validate_claims(&claims, now), Err(ClaimsError::Expired));
        }
    }
}
