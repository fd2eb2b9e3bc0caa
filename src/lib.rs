//! hyqa - Hybrid Question Answering
//!
//! Answers natural-language questions over a relational dataset and a
//! companion article corpus. The SQL channel decomposes the question into
//! read-only subqueries; the text channel runs a hybrid semantic and keyword
//! search; answer synthesis fuses both into one grounded reply.

pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod retrieval;
pub mod sql;
pub mod storage;
pub mod synthesis;

pub use error::{HyqaError, Result};
