use super::{ContainerInterface, DatasetLayout, child_path};
use crate::{
    error::{ConvertResult, FixtureResult},
    model::{Dataset, ElementType, TypedArray},
};
use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
};

/// A call made against a [RecordingContainer].
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Call {
    CreateFile(PathBuf),
    CreateGroup(String),
    CreateDataset(String),
    CommitType(String),
    SetAttribute { target: String, name: String },
    Close,
}

thread_local! {
    // Reset whenever a file is created
    static CALLS: RefCell<Vec<Call>> = const { RefCell::new(Vec::new()) };
}

/// In-memory container which records every call made against it, and rejects
/// names which already exist, as a real container would.
pub(crate) struct RecordingContainer {
    paths: HashSet<String>,
    attributes: HashMap<(String, String), TypedArray>,
}

impl RecordingContainer {
    /// Removes and returns every call recorded on this thread since the last
    /// file was created.
    pub(crate) fn take_calls() -> Vec<Call> {
        CALLS.with_borrow_mut(std::mem::take)
    }

    fn record(call: Call) {
        CALLS.with_borrow_mut(|calls| calls.push(call));
    }

    fn claim(&mut self, path: String) -> FixtureResult<String> {
        if self.paths.insert(path.clone()) {
            Ok(path)
        } else {
            Err(hdf5::Error::from("Name already exists")).err_path(&path)
        }
    }
}

impl ContainerInterface for RecordingContainer {
    type Handle = String;

    fn create_file(path: &Path) -> FixtureResult<Self> {
        CALLS.set(vec![Call::CreateFile(path.to_owned())]);
        Ok(Self {
            paths: HashSet::from(["/".to_owned()]),
            attributes: Default::default(),
        })
    }

    fn root(&self) -> FixtureResult<Self::Handle> {
        Ok("/".to_owned())
    }

    fn create_group(&mut self, parent: &Self::Handle, name: &str) -> FixtureResult<Self::Handle> {
        let path = self.claim(child_path(parent, name))?;
        Self::record(Call::CreateGroup(path.clone()));
        Ok(path)
    }

    fn create_dataset(
        &mut self,
        parent: &Self::Handle,
        name: &str,
        dataset: &Dataset,
    ) -> FixtureResult<Self::Handle> {
        let path = child_path(parent, name);
        DatasetLayout::resolve(dataset).err_path(&path)?;
        let path = self.claim(path)?;
        Self::record(Call::CreateDataset(path.clone()));
        Ok(path)
    }

    fn commit_type(
        &mut self,
        parent: &Self::Handle,
        name: &str,
        _: &ElementType,
    ) -> FixtureResult<Self::Handle> {
        let path = self.claim(child_path(parent, name))?;
        Self::record(Call::CommitType(path.clone()));
        Ok(path)
    }

    fn set_attribute(
        &mut self,
        target: &Self::Handle,
        name: &str,
        value: &TypedArray,
    ) -> FixtureResult<()> {
        self.attributes
            .insert((target.clone(), name.to_owned()), value.clone());
        Self::record(Call::SetAttribute {
            target: target.clone(),
            name: name.to_owned(),
        });
        Ok(())
    }

    fn close(self) -> FixtureResult<()> {
        Self::record(Call::Close);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_existing_names() {
        let mut container = RecordingContainer::create_file(Path::new("test.hdf5")).unwrap();
        let root = container.root().unwrap();
        container.create_group(&root, "x").unwrap();
        let error = container
            .commit_type(&root, "x", &"<i4".parse().unwrap())
            .unwrap_err();
        assert_eq!(error.hdf5_path(), Some("/x"));
        assert_eq!(
            RecordingContainer::take_calls(),
            vec![
                Call::CreateFile(PathBuf::from("test.hdf5")),
                Call::CreateGroup("/x".to_owned())
            ]
        );
    }

    #[test]
    fn attributes_are_replaced() {
        let mut container = RecordingContainer::create_file(Path::new("test.hdf5")).unwrap();
        let root = container.root().unwrap();
        let value = TypedArray::scalar("<i4".parse().unwrap(), 1i32).unwrap();
        container.set_attribute(&root, "a", &value).unwrap();
        container.set_attribute(&root, "a", &value).unwrap();
        assert_eq!(container.attributes.len(), 1);
        assert_eq!(
            container.attributes.get(&("/".to_owned(), "a".to_owned())),
            Some(&value)
        );
    }
}
