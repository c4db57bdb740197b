//! Boundary types: serde DTOs for the HTTP collaborators, the JSON-lines
//! replay reader used by the CLI, and the CSV summary writer.

pub mod api;
pub mod csv;
pub mod jsonl;
