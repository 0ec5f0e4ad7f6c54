//! `notes-auth` — authentication and ownership-authorization core.
//!
//! This crate is intentionally decoupled from HTTP and storage: it hashes and
//! verifies passwords, issues and validates bearer tokens or server-side
//! sessions, and decides whether a principal may touch a resource.

pub mod authorize;
pub mod claims;
pub mod password;
pub mod principal;
pub mod session;
pub mod token;
pub mod validator;

pub use authorize::{OwnershipError, authorize_owner, owned_or_not_found};
pub use claims::{ClaimsError, TOKEN_ISSUER, TokenClaims, validate_claims};
pub use password::{PasswordError, hash_password, verify_password, verify_password_or_decoy};
pub use principal::Principal;
pub use session::{
    InMemorySessionStore, SESSION_COOKIE_NAME, SessionAuthority, SessionCookie, SessionRecord,
    SessionStore,
};
pub use token::Hs256TokenAuthority;
pub use validator::{
    AuthError, Authenticator, CredentialIssuer, CredentialLocation, CredentialValidator,
    IssuedCredential,
};
