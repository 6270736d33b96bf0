//! Acquisition of the Udyam registration form schema: scrape the live page,
//! normalize its controls into a two-step field list, and cache the result
//! with a fallback for when the page is unreachable.

pub mod browser;
pub mod cache;
pub mod cli;
pub mod schema;
pub mod service;
pub mod validate;

pub use schema::schema_model::{Schema, SchemaField, SchemaSource};
pub use service::error::SchemaError;
pub use service::schema_service::{Acquisition, SchemaService};
