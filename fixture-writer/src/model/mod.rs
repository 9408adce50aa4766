//! In-memory model of a container file: a tree of groups, datasets and committed types,
//! each carrying attributes.
//!
//! The model performs no validation. Malformed trees, such as two members with the same
//! name or a payload inconsistent with its declared shape, are only detected when the tree
//! is compiled against a [ContainerInterface].
//!
//! [ContainerInterface]: crate::container::ContainerInterface
mod element_type;
mod typed_array;

pub(crate) use element_type::{ByteOrder, ElementType, EncodeError, Field, NumberKind};
use std::path::{Path, PathBuf};
pub(crate) use typed_array::{TypedArray, Value};

/// Named attributes, stored as an entry list so that construction never has to reject anything.
pub(crate) type Attributes = Vec<(String, TypedArray)>;

/// Named children of a group.
pub(crate) type Members = Vec<(String, Node)>;

#[derive(Clone, Debug)]
pub(crate) enum Node {
    Group(Group),
    Dataset(Dataset),
    #[cfg_attr(not(test), allow(dead_code, reason = "no fixture commits a named type"))]
    Datatype(Datatype),
}

impl From<Group> for Node {
    fn from(group: Group) -> Self {
        Node::Group(group)
    }
}

impl From<Dataset> for Node {
    fn from(dataset: Dataset) -> Self {
        Node::Dataset(dataset)
    }
}

impl From<Datatype> for Node {
    fn from(datatype: Datatype) -> Self {
        Node::Datatype(datatype)
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Group {
    pub(crate) members: Members,
    pub(crate) attrs: Attributes,
}

impl Group {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_member(mut self, name: &str, node: impl Into<Node>) -> Self {
        self.members.push((name.to_owned(), node.into()));
        self
    }

    pub(crate) fn with_attr(mut self, name: &str, value: TypedArray) -> Self {
        self.attrs.push((name.to_owned(), value));
        self
    }
}

/// The root group of a tree, together with the path it is written to.
#[derive(Clone, Debug)]
pub(crate) struct File {
    pub(crate) path: PathBuf,
    pub(crate) root: Group,
}

impl File {
    pub(crate) fn new(path: impl Into<PathBuf>, root: Group) -> Self {
        Self {
            path: path.into(),
            root,
        }
    }

    /// Moves the file into `directory`, keeping its file name.
    pub(crate) fn in_directory(self, directory: &Path) -> Self {
        let path = match self.path.file_name() {
            Some(name) => directory.join(name),
            None => directory.join(&self.path),
        };
        Self { path, ..self }
    }
}

/// Extra options used when creating a dataset.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct DatasetOptions {
    pub(crate) chunks: Option<Vec<usize>>,
    pub(crate) shuffle: bool,
    pub(crate) fletcher32: bool,
    pub(crate) fill_value: Option<TypedArray>,
}

impl DatasetOptions {
    pub(crate) fn chunked(chunks: &[usize]) -> Self {
        Self {
            chunks: Some(chunks.to_vec()),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Dataset {
    pub(crate) shape: Option<Vec<usize>>,
    pub(crate) dtype: Option<ElementType>,
    pub(crate) data: Option<TypedArray>,
    pub(crate) attrs: Attributes,
    pub(crate) options: DatasetOptions,
}

impl Dataset {
    /// A dataset whose shape and type are taken from its payload.
    pub(crate) fn from_data(data: TypedArray) -> Self {
        Self {
            data: Some(data),
            ..Default::default()
        }
    }

    /// A dataset with no payload, which the container fills with its fill value.
    #[cfg_attr(not(test), allow(dead_code, reason = "no fixture has an unfilled dataset"))]
    pub(crate) fn empty(shape: &[usize], dtype: ElementType) -> Self {
        Self {
            shape: Some(shape.to_vec()),
            dtype: Some(dtype),
            ..Default::default()
        }
    }

    pub(crate) fn with_options(self, options: DatasetOptions) -> Self {
        Self { options, ..self }
    }

    #[cfg_attr(not(test), allow(dead_code, reason = "no fixture dataset carries attributes"))]
    pub(crate) fn with_attr(mut self, name: &str, value: TypedArray) -> Self {
        self.attrs.push((name.to_owned(), value));
        self
    }
}

/// A type definition committed under its own name.
#[cfg_attr(not(test), allow(dead_code, reason = "no fixture commits a named type"))]
#[derive(Clone, Debug)]
pub(crate) struct Datatype {
    pub(crate) dtype: ElementType,
    pub(crate) attrs: Attributes,
}

#[cfg_attr(not(test), allow(dead_code, reason = "no fixture commits a named type"))]
impl Datatype {
    pub(crate) fn new(dtype: ElementType) -> Self {
        Self {
            dtype,
            attrs: Attributes::default(),
        }
    }

    pub(crate) fn with_attr(mut self, name: &str, value: TypedArray) -> Self {
        self.attrs.push((name.to_owned(), value));
        self
    }
}
