use std::{io, path::PathBuf};

use thiserror::Error;
use uxsd::SchemaError;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("{first:?} and {second:?} both map to the Rust name `{rust_name}`")]
    NameCollision {
        first: String,
        second: String,
        rust_name: String,
    },
    #[error("{0} is out of date")]
    Stale(PathBuf),
}
