/// Authentication module
///
/// JWT issuance and validation, the refresh-token renewal protocol, the
/// request principal and password hashing.

mod claims;
mod issuer;
mod password;
mod principal;
mod refresh_token;
mod renewal;
mod signer;
mod validator;

pub use claims::{decode_header, encode_header, token_header, TokenClaims};
pub use issuer::TokenIssuer;
pub use password::{hash_password, validate_password_strength, verify_password};
pub use principal::{AuthenticatedPrincipal, ROLE_USER};
pub use refresh_token::{hash_refresh_token, RefreshTokenError};
pub use renewal::TokenService;
pub use signer::{SigningKey, TokenSigner};
pub use validator::TokenValidator;
