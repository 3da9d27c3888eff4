// src/render/mod.rs

//! Environment-variable substitution.
//!
//! - [`environment`] builds the immutable name -> value snapshot the renderer
//!   sees, including the derived statefulset ordinal.
//! - [`substitute`] is the pure renderer itself.

pub mod environment;
pub mod substitute;

pub use environment::{extract_ordinal, Environment, STATEFULSET_ORDINAL_VAR};
pub use substitute::render;
