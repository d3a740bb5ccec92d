//! storefront-hex: application core for the storefront API (services +
//! inbound HTTP adapter), independent of any concrete persistence backend.

pub mod config;
pub mod errors;

pub mod application;

pub use storefront_types::{domain, ports};

pub mod inbound; // HTTP adapter (server + handlers)
