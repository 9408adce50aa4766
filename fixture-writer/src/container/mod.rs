//! Defines the [ContainerInterface] trait, the narrow set of capabilities the
//! [compiler] needs from a hierarchical container library.
//!
//! The [Hdf5Container] struct implements this against real HDF5 files, and the
//! [RecordingContainer] mock implements it in memory, which allows the compiler
//! to be tested with or without actual hdf5 file interactions.
//!
//! [compiler]: crate::compiler
mod hdf5_container;
mod raw;
#[cfg(test)]
mod recording_container;

use crate::{
    error::{FixtureResult, LayoutError},
    model::{ByteOrder, Dataset, DatasetOptions, ElementType, NumberKind, TypedArray},
};
pub(crate) use hdf5_container::Hdf5Container;
#[cfg(test)]
pub(crate) use raw::inspect;
#[cfg(test)]
pub(crate) use recording_container::{Call, RecordingContainer};
use std::path::Path;

pub(crate) trait ContainerInterface: Sized {
    /// Anything attributes can be attached to: groups, datasets and committed types.
    type Handle;

    /// Creates a new container file, replacing any existing file at `path`.
    fn create_file(path: &Path) -> FixtureResult<Self>;

    /// Returns the handle of the unnamed root group.
    fn root(&self) -> FixtureResult<Self::Handle>;

    fn create_group(&mut self, parent: &Self::Handle, name: &str) -> FixtureResult<Self::Handle>;

    /// Creates a dataset from the model's shape, type, payload and options.
    /// # Error Modes
    /// Implementations should resolve the layout with [DatasetLayout::resolve] and
    /// propagate its errors, with the dataset's hdf5 path attached.
    fn create_dataset(
        &mut self,
        parent: &Self::Handle,
        name: &str,
        dataset: &Dataset,
    ) -> FixtureResult<Self::Handle>;

    /// Commits `dtype` as a named type in `parent`.
    fn commit_type(
        &mut self,
        parent: &Self::Handle,
        name: &str,
        dtype: &ElementType,
    ) -> FixtureResult<Self::Handle>;

    fn set_attribute(
        &mut self,
        target: &Self::Handle,
        name: &str,
        value: &TypedArray,
    ) -> FixtureResult<()>;

    /// Takes ownership and closes the file.
    fn close(self) -> FixtureResult<()>;
}

/// Joins a member name onto the hdf5 path of its parent.
pub(crate) fn child_path(parent: &str, name: &str) -> String {
    if parent.ends_with('/') {
        format!("{parent}{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// Shape, type, payload and options of a dataset, reconciled with each other.
#[derive(Debug)]
pub(crate) struct DatasetLayout<'a> {
    pub(crate) shape: Vec<usize>,
    pub(crate) dtype: &'a ElementType,
    pub(crate) data: Option<&'a TypedArray>,
    pub(crate) options: &'a DatasetOptions,
}

static DEFAULT_DTYPE: ElementType = ElementType::number(NumberKind::F32, ByteOrder::Little);

impl<'a> DatasetLayout<'a> {
    /// Fills in the shape and type of a dataset from its payload, where they are not
    /// declared, and checks the result is consistent.
    /// # Error Modes
    /// - [LayoutError::MissingShape] if there is neither a shape nor a payload.
    /// - [LayoutError::ShapeMismatch] if the declared shape does not fit the payload.
    /// - [LayoutError::DtypeMismatch] if the declared type is not the payload's type.
    /// - [LayoutError::ChunkRank], [LayoutError::InvalidChunk] or [LayoutError::ChunkedScalar]
    ///   if the chunk shape does not suit the dataset.
    /// - [LayoutError::FiltersRequireChunks] if filters are requested without chunking.
    /// - [LayoutError::FillValue] if the fill value is not a scalar of the dataset's type.
    pub(crate) fn resolve(dataset: &'a Dataset) -> Result<Self, LayoutError> {
        let data = dataset.data.as_ref();

        let shape = match (&dataset.shape, data) {
            (Some(shape), Some(data)) if shape.iter().product::<usize>() != data.len() => {
                return Err(LayoutError::ShapeMismatch {
                    shape: shape.clone(),
                    elements: data.len(),
                });
            }
            (Some(shape), _) => shape.clone(),
            (None, Some(data)) => data.shape().to_vec(),
            (None, None) => return Err(LayoutError::MissingShape),
        };

        let dtype = match (&dataset.dtype, data) {
            (Some(declared), Some(data)) if declared != data.dtype() => {
                return Err(LayoutError::DtypeMismatch {
                    declared: declared.to_string(),
                    data: data.dtype().to_string(),
                });
            }
            (Some(declared), _) => declared,
            (None, Some(data)) => data.dtype(),
            (None, None) => &DEFAULT_DTYPE,
        };

        let options = &dataset.options;
        match &options.chunks {
            Some(_) if shape.is_empty() => return Err(LayoutError::ChunkedScalar),
            Some(chunks) if chunks.len() != shape.len() => {
                return Err(LayoutError::ChunkRank {
                    chunks: chunks.clone(),
                    rank: shape.len(),
                });
            }
            Some(chunks) if chunks.contains(&0) => {
                return Err(LayoutError::InvalidChunk(chunks.clone()));
            }
            Some(_) => {}
            None if options.shuffle || options.fletcher32 => {
                return Err(LayoutError::FiltersRequireChunks);
            }
            None => {}
        }

        if let Some(fill_value) = &options.fill_value {
            if !fill_value.is_scalar() || fill_value.dtype() != dtype {
                return Err(LayoutError::FillValue {
                    expected: dtype.to_string(),
                    found: fill_value.dtype().to_string(),
                });
            }
        }

        Ok(Self {
            shape,
            dtype,
            data,
            options,
        })
    }
}
