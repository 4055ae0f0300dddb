//! Core types and traits for the Diablo in-memory graph library.
//!
//! Record types match the line-delimited JSON layout of `nodes.jsonl` / `edges.jsonl`.

mod config;
mod dto;
mod traits;

pub use config::*;
pub use dto::*;
pub use traits::*;
