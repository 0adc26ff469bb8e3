//! Unlock sessions for password-protected pages.
//!
//! This module provides:
//! - The page context: payload metadata, alert messages and options
//! - A cache of derived keys so returning viewers skip the password
//! - The session controller driving cache, derivation, decryption and verification
//!
//! # Architecture
//! The session module sits between the page host (which renders content and
//! collects passwords) and the crypto and storage modules. No error crosses
//! the controller; every failure becomes an [`UnlockOutcome`] and, on the
//! password path, an alert.

pub mod cache;
pub mod config;
pub mod controller;
pub mod host;

pub use cache::{CachedKeyBundle, KeyCache};
pub use config::{Messages, PageConfig, PageContext, RenderPolicy, SessionOptions};
pub use controller::{SessionController, SessionHandle, SessionState, UnlockOutcome};
pub use host::PageHost;
