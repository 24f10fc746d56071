//! CSV source arguments.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use blockflow_runtime::prelude::TableName;

/// A CSV file registered as a source table, given as `name=path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceArg {
    /// Table name the file is registered under.
    pub name: TableName,
    /// Path to the CSV file.
    pub path: PathBuf,
}

/// Error parsing a `name=path` source argument.
#[derive(Debug, thiserror::Error)]
pub enum SourceArgError {
    #[error("expected `name=path`, got `{0}`")]
    MissingSeparator(String),
    #[error("source table name `{0}` must be a plain identifier")]
    InvalidName(String),
    #[error("source path is empty")]
    EmptyPath,
}

impl SourceArg {
    /// Reads the file content.
    pub async fn read(&self) -> anyhow::Result<String> {
        tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read source file {}", self.path.display()))
    }
}

impl FromStr for SourceArg {
    type Err = SourceArgError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (name, path) = value
            .split_once('=')
            .ok_or_else(|| SourceArgError::MissingSeparator(value.to_owned()))?;

        let name = TableName::new(name.trim());
        if !name.is_plain_identifier() {
            return Err(SourceArgError::InvalidName(name.as_str().to_owned()));
        }
        if path.is_empty() {
            return Err(SourceArgError::EmptyPath);
        }

        Ok(Self {
            name,
            path: PathBuf::from(path),
        })
    }
}
