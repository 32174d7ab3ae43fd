//! PaySync Core - Domain logic and port definitions
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `Payment`, `SyncStatus`, validated newtypes
//! - **Port definitions** - Traits for adapters: `ILocalStore`, `IRemoteStore`,
//!   `IAuthProvider`, `IEventSink`
//! - **Configuration** - YAML-backed settings shared by every binary
//!
//! # Architecture
//!
//! The domain module contains pure business logic with no I/O.
//! Ports define trait interfaces that adapter crates implement
//! (`paysync-cache` for SQLite, `paysync-remote` for the REST backend).
//! The synchronization coordinator in `paysync-sync` drives the ports.

pub mod config;
pub mod domain;
pub mod ports;
