//! Nimbus Core
//!
//! Resource model, attribute schemas and the provider contract that every
//! nimbus resource binding is driven through.

pub mod provider;
pub mod resource;
pub mod schema;
