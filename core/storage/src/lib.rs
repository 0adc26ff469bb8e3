//! Key-value persistence for PageLock.
//!
//! This module provides a trait-based interface for the store that keeps
//! cached key bundles between visits, plus a tagged configuration that
//! selects and opens one.
//!
//! # Design Principles
//! - Store isolation: no store-specific logic in the session or crypto modules
//! - Async operations: all I/O operations are async
//! - Records are opaque strings; the session layer owns their format

pub mod config;
pub mod local;
pub mod memory;
pub mod provider;

pub use config::StoreConfig;
pub use local::LocalStore;
pub use memory::MemoryStore;
pub use provider::KeyValueStore;
