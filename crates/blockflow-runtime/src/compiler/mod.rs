//! Block configuration validation and SQL compilation.
//!
//! Compilation is pure: given a configuration and the names of the input and
//! output tables it produces one deterministic statement. Validation runs
//! before compilation and reports the first missing piece of configuration.

mod plan;
mod sql;
mod validator;

pub use plan::{CompiledBlock, CompiledPlan, SkippedBlock, compile_plan, output_table_of};
pub use sql::{
    ROW_COUNT_COLUMN, SqlStatement, compile, compile_count, compile_drop, compile_preview,
    quote_identifier, quote_literal,
};
pub use validator::{ValidationError, validate, validate_config};
