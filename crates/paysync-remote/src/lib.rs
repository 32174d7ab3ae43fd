//! PaySync Remote - REST backend adapter
//!
//! Provides:
//! - An authenticated HTTP client for a PostgREST-style table API
//! - The `IRemoteStore` implementation over the payments table
//! - Keyring-backed session storage and the `IAuthProvider` built on it
//!
//! ## Modules
//!
//! - [`auth`] - Session storage and the current-user provider
//! - [`client`] - HTTP client with auth headers and status classification
//! - [`store`] - `RestPaymentStore`, the remote payments table

pub mod auth;
pub mod client;
pub mod store;

pub use auth::{KeyringSessionStorage, SessionAuthProvider, SessionStorage};
pub use client::RestClient;
pub use paysync_core::ports::RemoteError;
pub use store::RestPaymentStore;
