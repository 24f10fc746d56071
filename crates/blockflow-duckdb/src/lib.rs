#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod engine;
mod error;
mod value;

pub use engine::DuckDbEngine;
pub use error::{Error, Result};

/// Tracing target for DuckDB engine operations.
pub const TRACING_TARGET: &str = "blockflow_duckdb";
