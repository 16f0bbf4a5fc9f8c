//! Data-driven catalog loading for the backlot simulation core.
//!
//! Game content — item upgrade chains, department crate configs, recipe
//! specs, the talent roster, synergy and dailies tuning — ships as JSON or
//! RON data files. This crate deserializes them via [`schema`] and resolves
//! every string reference into a frozen [`backlot_core::catalog::Catalog`].

pub mod loader;
pub mod schema;

pub use loader::{DataLoadError, load_catalog_json, load_catalog_ron};
