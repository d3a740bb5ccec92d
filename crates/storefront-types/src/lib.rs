//! storefront-types: domain model and collaborator ports for the order backend.

pub mod domain;
pub mod ports;
