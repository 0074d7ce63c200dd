//! Client directory adapters.
//!
//! The trait and the in-memory implementation live in `mqgate-auth`; this
//! module holds the storage-backed ones.

pub mod postgres;

pub use postgres::PostgresClientDirectory;
