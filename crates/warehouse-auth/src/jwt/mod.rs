//! JWT issue and validation.

pub mod claims;
pub mod codec;

pub use claims::TokenClaims;
pub use codec::ClaimsCodec;
