//! Error types for container reads and writes.

use crate::npy::{ReadNpyError, WriteNpyError};
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use zip::result::ZipError;

/// Main error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("schema mismatch: {0}")]
    Schema(#[from] SchemaError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("not found: {0}")]
    NotFound(#[from] NotFound),

    #[error("container error: {0}")]
    Container(ZipError),

    #[error("error reading array: {0}")]
    ReadNpy(#[from] ReadNpyError),

    #[error("error writing array: {0}")]
    WriteNpy(#[from] WriteNpyError),
}

impl Error {
    /// `true` for a missing source, a source that is not a container, or a
    /// missing dataset.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

impl From<ZipError> for Error {
    fn from(err: ZipError) -> Error {
        match err {
            ZipError::Io(err) => Error::Io(err),
            err => Error::Container(err),
        }
    }
}

/// Specialized `Result` for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Input that cannot be stored.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("trajectory must have 3 dimensions (co-ords, samples, traces), got {0}")]
    TrajectoryRank(usize),

    #[error("trajectory must have between 1 and 3 co-ordinates, got {0}")]
    TrajectoryCoords(usize),

    #[error("{labels} axis labels given for an array with {ndim} dimensions")]
    LabelCount { labels: usize, ndim: usize },

    #[error("invalid entry name {0:?}")]
    EntryName(String),

    #[error("dataset name {0:?} is reserved")]
    ReservedName(String),

    #[error("entry {0:?} was already written")]
    DuplicateEntry(String),
}

/// Data that does not follow the fixed record layouts.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchemaError {
    #[error("info record is missing field `{0}`")]
    MissingField(&'static str),

    #[error("info record has no field `{0}`")]
    UnknownField(String),

    #[error("value {value:?} does not fit info field `{field}`")]
    FieldShape {
        field: &'static str,
        value: crate::info::FieldValue,
    },

    #[error("info record has descriptor {0}, which does not match the fixed layout")]
    InfoDescriptor(py_literal::Value),

    #[error("expected exactly one info record, found {0}")]
    InfoCount(usize),

    #[error("info record holds {actual} bytes, expected {expected}")]
    InfoSize { expected: usize, actual: usize },

    #[error("metadata entry `{key}` has unsupported descriptor {descr}")]
    MetaDescriptor { key: String, descr: py_literal::Value },

    #[error("metadata entry `{0}` is empty")]
    EmptyMeta(String),
}

/// Something the caller asked for does not exist.
#[derive(Debug, Error)]
pub enum NotFound {
    #[error("no such file {0:?}")]
    Source(PathBuf),

    #[error("source is not a valid container: {0}")]
    InvalidContainer(ZipError),

    #[error("no dataset named `{0}`")]
    Dataset(String),
}
