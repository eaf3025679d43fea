//! Core contracts: the project model, parameters, queries, and editors.

pub mod editor;
pub mod errors;
pub mod model;
pub mod params;
pub mod query;
