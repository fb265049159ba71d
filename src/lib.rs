//! swcache - Offline page cache router
//!
//! Keeps a versioned cache of a site's critical assets and routes each
//! request through the caching strategy its class calls for: cache-first
//! for static assets, stale-while-revalidate and immutable cache-first for
//! web fonts, network-first with an offline fallback for navigations, and
//! network-only for everything else.

pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod network;
pub mod store;
pub mod ui;
pub mod worker;

pub use error::{SwError, SwResult};
