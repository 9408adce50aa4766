//! Walks a model tree depth first and writes it through a [ContainerInterface].
//!
//! Members of each group are created in lexicographic order of their names, and a
//! group's own attributes are only set once all of its members exist. The first
//! failure aborts the walk.
use crate::{
    container::ContainerInterface,
    error::FixtureResult,
    model::{Attributes, File, Group, Node},
};
use itertools::Itertools;
use tracing::{debug, info};

/// Creates the file at `file.path`, replacing any existing file, writes the whole
/// tree into it, and closes it.
/// # Error Modes
/// - Propagates any error from the container, in which case the file is left as it
///   was at the point of failure.
#[tracing::instrument(skip_all, fields(path = %file.path.display()), err(level = "warn"))]
pub(crate) fn compile<C: ContainerInterface>(file: &File) -> FixtureResult<()> {
    let mut container = C::create_file(&file.path)?;
    let root = container.root()?;
    store_group(&mut container, &root, &file.root)?;
    drop(root);
    container.close()?;
    info!("Wrote {}", file.path.display());
    Ok(())
}

fn store_group<C: ContainerInterface>(
    container: &mut C,
    handle: &C::Handle,
    group: &Group,
) -> FixtureResult<()> {
    for (name, node) in group.members.iter().sorted_by(|(a, _), (b, _)| a.cmp(b)) {
        debug!("Storing {name}");
        match node {
            Node::Group(subgroup) => {
                let subgroup_handle = container.create_group(handle, name)?;
                store_group(container, &subgroup_handle, subgroup)?;
            }
            Node::Dataset(dataset) => {
                let dataset_handle = container.create_dataset(handle, name, dataset)?;
                update_attrs(container, &dataset_handle, &dataset.attrs)?;
            }
            Node::Datatype(datatype) => {
                let datatype_handle = container.commit_type(handle, name, &datatype.dtype)?;
                update_attrs(container, &datatype_handle, &datatype.attrs)?;
            }
        }
    }
    update_attrs(container, handle, &group.attrs)
}

fn update_attrs<C: ContainerInterface>(
    container: &mut C,
    handle: &C::Handle,
    attrs: &Attributes,
) -> FixtureResult<()> {
    for (name, value) in attrs.iter().sorted_by(|(a, _), (b, _)| a.cmp(b)) {
        container.set_attribute(handle, name, value)?;
    }
    Ok(())
}
