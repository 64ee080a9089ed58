//! # auth-adapters
//!
//! Implementations of the `TokenIssuer` / `TokenVerifier` ports.

#[cfg(feature = "auth-jwt")]
pub mod jwt;

#[cfg(feature = "auth-jwt")]
pub use jwt::JwtTokens;
