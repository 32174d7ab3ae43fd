//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the sync core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`ILocalStore`] - The on-device payment store
//! - [`IRemoteStore`] - The authenticated remote payment table
//! - [`IAuthProvider`] - Current user and bearer token
//! - [`IEventSink`] - Observability hook for created/updated/synced events

pub mod auth_provider;
pub mod event_sink;
pub mod local_store;
pub mod remote_store;

pub use auth_provider::{AuthError, IAuthProvider, Session};
pub use event_sink::{IEventSink, NoopEventSink, SyncEvent};
pub use local_store::ILocalStore;
pub use remote_store::{IRemoteStore, RemoteError, RemotePaymentDto};
