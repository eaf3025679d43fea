//! Application layer wiring editors, queries, and project loading together.

pub mod editors;
pub mod load;
pub mod manifest;
pub mod query;
pub mod registry;
