use crate::model::EncodeError;
use std::{error::Error, ffi::NulError};
use thiserror::Error;

pub(crate) type FixtureResult<T> = Result<T, FixtureError>;

const NO_HDF5_PATH_SET: &str = "[No HDF5 Path Set]";

/// Reasons a dataset's shape, type, payload and creation options cannot be
/// reconciled into a single layout.
#[derive(Debug, Error)]
pub(crate) enum LayoutError {
    #[error("One of data or shape must be specified")]
    MissingShape,
    #[error("Shape {shape:?} is incompatible with data of {elements} elements")]
    ShapeMismatch { shape: Vec<usize>, elements: usize },
    #[error("Declared dtype {declared} differs from data dtype {data}")]
    DtypeMismatch { declared: String, data: String },
    #[error("Chunk shape {chunks:?} must have the same rank as the dataset ({rank})")]
    ChunkRank { chunks: Vec<usize>, rank: usize },
    #[error("Chunk shape {0:?} contains a zero extent")]
    InvalidChunk(Vec<usize>),
    #[error("Chunked layout is not allowed for scalar datasets")]
    ChunkedScalar,
    #[error("Shuffle and fletcher32 filters require a chunk shape")]
    FiltersRequireChunks,
    #[error("Fill value must be a scalar of dtype {expected}, found {found}")]
    FillValue { expected: String, found: String },
}

#[derive(Debug, Error)]
pub(crate) enum FixtureError {
    #[error("HDF5 Error: {error} at {0}", hdf5_path.as_deref().unwrap_or(NO_HDF5_PATH_SET))]
    HDF5 {
        error: hdf5::Error,
        hdf5_path: Option<String>,
    },
    #[error("Encoding Error: {error} at {0}", hdf5_path.as_deref().unwrap_or(NO_HDF5_PATH_SET))]
    Encode {
        error: EncodeError,
        hdf5_path: Option<String>,
    },
    #[error("Dataset Layout Error: {error} at {0}", hdf5_path.as_deref().unwrap_or(NO_HDF5_PATH_SET))]
    Layout {
        error: LayoutError,
        hdf5_path: Option<String>,
    },
    #[error("Invalid Name {error} at {0}", hdf5_path.as_deref().unwrap_or(NO_HDF5_PATH_SET))]
    InvalidName {
        error: NulError,
        hdf5_path: Option<String>,
    },
    #[error("Invalid dtype string {0:?}")]
    InvalidDtype(String),
}

impl FixtureError {
    fn with_hdf5_path(self, path: String) -> Self {
        match self {
            Self::HDF5 {
                error,
                hdf5_path: None,
            } => Self::HDF5 {
                error,
                hdf5_path: Some(path),
            },
            Self::Encode {
                error,
                hdf5_path: None,
            } => Self::Encode {
                error,
                hdf5_path: Some(path),
            },
            Self::Layout {
                error,
                hdf5_path: None,
            } => Self::Layout {
                error,
                hdf5_path: Some(path),
            },
            Self::InvalidName {
                error,
                hdf5_path: None,
            } => Self::InvalidName {
                error,
                hdf5_path: Some(path),
            },
            other => other,
        }
    }

    /// The hdf5 path the error was raised at, if one was attached.
    #[cfg(test)]
    pub(crate) fn hdf5_path(&self) -> Option<&str> {
        match self {
            Self::HDF5 { hdf5_path, .. }
            | Self::Encode { hdf5_path, .. }
            | Self::Layout { hdf5_path, .. }
            | Self::InvalidName { hdf5_path, .. } => hdf5_path.as_deref(),
            Self::InvalidDtype(_) => None,
        }
    }
}

impl From<hdf5::Error> for FixtureError {
    fn from(error: hdf5::Error) -> Self {
        FixtureError::HDF5 {
            error,
            hdf5_path: None,
        }
    }
}

impl From<EncodeError> for FixtureError {
    fn from(error: EncodeError) -> Self {
        FixtureError::Encode {
            error,
            hdf5_path: None,
        }
    }
}

impl From<LayoutError> for FixtureError {
    fn from(error: LayoutError) -> Self {
        FixtureError::Layout {
            error,
            hdf5_path: None,
        }
    }
}

impl From<NulError> for FixtureError {
    fn from(error: NulError) -> Self {
        FixtureError::InvalidName {
            error,
            hdf5_path: None,
        }
    }
}

/// Used to allow errors which can be converted to [FixtureError]s to be
/// appended with the hdf5 path of the object being written.
pub(crate) trait ConvertResult<T, E>
where
    E: Error + Into<FixtureError>,
{
    fn err_path(self, path: &str) -> FixtureResult<T>;
}

impl<T, E> ConvertResult<T, E> for Result<T, E>
where
    E: Error + Into<FixtureError>,
{
    fn err_path(self, path: &str) -> FixtureResult<T> {
        self.map_err(|e| e.into().with_hdf5_path(path.to_owned()))
    }
}
