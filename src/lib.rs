//! # authkeeper
//!
//! Client-side session management for REST backends that issue `JWT`
//! access/refresh pairs.
//!
//! ## Components
//!
//! - [`token`]: decodes bearer token payloads without verifying signatures.
//! - [`validators`]: form rules checked before anything reaches the network.
//! - [`storage`]: durable key-value persistence of the token pair.
//! - [`session`]: the in-memory session, hydrated from storage at start.
//! - [`transport`]: HTTP client that injects the bearer token and, on a `401`,
//!   performs a single-flight refresh and replays the request once.
//! - [`api`]: stateless wrappers over the backend's `/auth/*` endpoints.
//! - [`store`]: the credential store driving login, logout, refresh and the
//!   account flows, with navigation side effects.
//! - [`navigation`]: views, route metadata and the navigation guard.
//! - [`renew`]: optional background refresh ahead of token expiry.
//!
//! ## Refresh coordination
//!
//! When several requests fail authorization at once, exactly one refresh call
//! is issued. Requests arriving while it is outstanding are queued and released
//! in arrival order with the refreshed token, or rejected with the refresh
//! failure, in which case the session is cleared and the user is sent to the
//! login view.
//!
//! Tokens are held as [`secrecy::SecretString`] and must never be logged.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod navigation;
pub mod renew;
pub mod session;
pub mod storage;
pub mod store;
pub mod token;
pub mod transport;
pub mod validators;

mod refresh;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub use error::{Error, Result};

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
