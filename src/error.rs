//! Typed failures of the plotting pipeline.
//!
//! Every variant is fatal: the invocation aborts before anything is drawn.
//! `main` wraps them in `anyhow` so they surface with a non-zero exit code.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlotError {
    /// The file could not be read, lacks a required column, or holds a value
    /// that does not parse.
    #[error("{}: {reason}", path.display())]
    FileFormat { path: PathBuf, reason: String },

    /// A feature was requested without the file it is drawn from.
    #[error("--{feature} requires at least one {required} file")]
    MissingSource {
        feature: &'static str,
        required: &'static str,
    },

    /// Two file lists disagree on how many instances are plotted.
    #[error(
        "inconsistent instance count: {found_in} has {found} file(s) \
         but {reference_in} has {reference}"
    )]
    InstanceCountMismatch {
        found_in: &'static str,
        found: usize,
        reference_in: &'static str,
        reference: usize,
    },

    #[error("the number of names ({names}) must equal the number of instances ({instances})")]
    NameCountMismatch { names: usize, instances: usize },

    /// A power state was given more than one role.
    #[error("power state collision between {first} and {second}: {states:?}")]
    PowerStateCollision {
        first: &'static str,
        second: &'static str,
        states: Vec<i32>,
    },

    #[error("{count} job(s) have an unexpected allocation")]
    AllocationMismatch { count: usize },

    #[error("no non-zero energy value found after '{marker}'")]
    NoHistogramValues { marker: &'static str },
}

impl PlotError {
    pub fn file_format(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        PlotError::FileFormat {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
