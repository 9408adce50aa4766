use super::{
    ContainerInterface, DatasetLayout, child_path,
    raw::{self, OwnedId},
};
use crate::{
    error::{ConvertResult, FixtureResult},
    model::{Dataset, ElementType, TypedArray},
};
use hdf5_sys::h5i::hid_t;
use std::path::Path;
use tracing::debug;

/// Writes the model to a real hdf5 file.
pub(crate) struct Hdf5Container {
    file: hdf5::File,
}

/// A group opened through the `hdf5` crate, or a dataset or committed type
/// created directly through the C library.
#[derive(Debug)]
pub(crate) enum Hdf5Handle {
    Group(hdf5::Group),
    Object { id: OwnedId, path: String },
}

impl Hdf5Handle {
    fn id(&self) -> hid_t {
        match self {
            Self::Group(group) => group.id(),
            Self::Object { id, .. } => id.id(),
        }
    }

    fn path(&self) -> String {
        match self {
            Self::Group(group) => group.name(),
            Self::Object { path, .. } => path.clone(),
        }
    }

    fn as_group(&self) -> FixtureResult<&hdf5::Group> {
        match self {
            Self::Group(group) => Ok(group),
            Self::Object { path, .. } => {
                Err(hdf5::Error::from("Only groups can have members")).err_path(path)
            }
        }
    }
}

impl ContainerInterface for Hdf5Container {
    type Handle = Hdf5Handle;

    #[tracing::instrument(skip_all, level = "trace", fields(path = %path.display()), err(level = "warn"))]
    fn create_file(path: &Path) -> FixtureResult<Self> {
        let file = hdf5::File::create(path).err_path("/")?;
        debug!("Created {}", path.display());
        Ok(Self { file })
    }

    fn root(&self) -> FixtureResult<Self::Handle> {
        Ok(Hdf5Handle::Group(self.file.group("/").err_path("/")?))
    }

    #[tracing::instrument(skip_all, level = "trace", fields(name = name), err(level = "warn"))]
    fn create_group(&mut self, parent: &Self::Handle, name: &str) -> FixtureResult<Self::Handle> {
        let path = child_path(&parent.path(), name);
        let group = parent
            .as_group()?
            .create_group(name)
            .err_path(&path)?;
        Ok(Hdf5Handle::Group(group))
    }

    #[tracing::instrument(skip_all, level = "trace", fields(name = name), err(level = "warn"))]
    fn create_dataset(
        &mut self,
        parent: &Self::Handle,
        name: &str,
        dataset: &Dataset,
    ) -> FixtureResult<Self::Handle> {
        let path = child_path(&parent.path(), name);
        let layout = DatasetLayout::resolve(dataset).err_path(&path)?;
        let c_name = raw::c_name(name).err_path(&path)?;
        let id = raw::create_dataset(parent.as_group()?.id(), &c_name, &layout).err_path(&path)?;
        debug!("Created dataset {path} of shape {:?} and dtype {}", layout.shape, layout.dtype);
        Ok(Hdf5Handle::Object { id, path })
    }

    #[tracing::instrument(skip_all, level = "trace", fields(name = name), err(level = "warn"))]
    fn commit_type(
        &mut self,
        parent: &Self::Handle,
        name: &str,
        dtype: &ElementType,
    ) -> FixtureResult<Self::Handle> {
        let path = child_path(&parent.path(), name);
        let c_name = raw::c_name(name).err_path(&path)?;
        let id = raw::commit_type(parent.as_group()?.id(), &c_name, dtype).err_path(&path)?;
        Ok(Hdf5Handle::Object { id, path })
    }

    #[tracing::instrument(skip_all, level = "trace", fields(name = name), err(level = "warn"))]
    fn set_attribute(
        &mut self,
        target: &Self::Handle,
        name: &str,
        value: &TypedArray,
    ) -> FixtureResult<()> {
        let path = target.path();
        let c_name = raw::c_name(name).err_path(&path)?;
        raw::write_attribute(target.id(), &c_name, value).err_path(&path)
    }

    #[tracing::instrument(skip_all, level = "trace", err(level = "warn"))]
    fn close(self) -> FixtureResult<()> {
        self.file.close().err_path("/")
    }
}
