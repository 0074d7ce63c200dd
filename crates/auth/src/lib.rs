//! `mqgate-auth`: client identity and bearer-token boundary.
//!
//! This crate is intentionally decoupled from HTTP and from any particular
//! storage engine: persistence is reached through [`ClientDirectory`].

pub mod claims;
pub mod client;
pub mod directory;
pub mod jwt;
pub mod service;

pub use claims::{ClientClaims, TokenValidationError, validate_claims};
pub use client::{ApiKey, ClientRecord};
pub use directory::{ClientDirectory, DirectoryError, InMemoryClientDirectory};
pub use jwt::{Hs256JwtValidator, Hs256TokenIssuer, JwtError, JwtValidator, TokenIssuer};
pub use service::{AuthError, authenticate_client, register_client, remove_client, update_client};
