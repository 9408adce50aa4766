//! The fixture files written by this program, each built as a model tree.
use crate::{
    error::FixtureResult,
    model::{Dataset, DatasetOptions, ElementType, Field, File, Group, TypedArray, Value},
};
use clap::ValueEnum;
use ndarray::Array2;
use strum::{Display, EnumIter, IntoEnumIterator};

const COMPOUND_RECORDS: usize = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter, ValueEnum)]
#[strum(serialize_all = "kebab-case")]
pub(crate) enum FixtureKind {
    /// A group carrying string and integer attributes, with empty subgroups.
    Attributes,
    /// A chunked dataset of structured records.
    CompoundChunked,
}

impl FixtureKind {
    pub(crate) fn all() -> Vec<Self> {
        Self::iter().collect()
    }

    pub(crate) fn build(self) -> FixtureResult<File> {
        match self {
            FixtureKind::Attributes => file_attrs(),
            FixtureKind::CompoundChunked => file_dset(),
        }
    }
}

fn dtype(descriptor: &str) -> FixtureResult<ElementType> {
    descriptor.parse()
}

/// The "attributes" fixture, also used by group tests.
pub(crate) fn file_attrs() -> FixtureResult<File> {
    let group = Group::new()
        .with_member("Subgroup1", Group::new())
        .with_member("Subgroup2", Group::new())
        .with_member("Subgroup3", Group::new())
        .with_attr(
            "String Attribute",
            TypedArray::scalar(dtype("|S18")?, "This is a string.")?,
        )
        .with_attr("Integer", TypedArray::scalar(dtype("<i4")?, 42i32)?)
        .with_attr("Integer Array", TypedArray::vector(dtype("<i4")?, 0..4i32)?)
        .with_attr("Byte", TypedArray::scalar(dtype("|i1")?, -34i8)?);
    Ok(File::new(
        "attributes.hdf5",
        Group::new().with_member("Group", group),
    ))
}

/// The record type of the "CompoundChunked" dataset.
fn compound_dtype() -> FixtureResult<ElementType> {
    Ok(ElementType::Compound(vec![
        Field::new("a_name", dtype(">i4")?),
        Field::new("c_name", dtype("|S6")?),
        Field::new("d_name", ElementType::array(dtype(">i2")?, &[5, 10])),
        Field::new("e_name", dtype(">f4")?),
        Field::new("f_name", ElementType::array(dtype(">f8")?, &[10])),
        Field::new("g_name", dtype("<u1")?),
    ]))
}

fn compound_record(i: usize) -> Value {
    let grid = Array2::from_shape_fn((5, 10), |(row, col)| Value::from((row + col + i) as i64));
    Value::Record(vec![
        Value::from(i as i64),
        Value::from("Hello!"),
        Value::List(grid.iter().cloned().collect()),
        Value::Float(0.96 * i as f64),
        Value::List(vec![Value::Float(1024.9637 * i as f64); 10]),
        Value::from(109u8),
    ])
}

/// The "dataset" fixture: one chunked dataset of structured records.
pub(crate) fn file_dset() -> FixtureResult<File> {
    let records = (0..COMPOUND_RECORDS)
        .map(compound_record)
        .collect::<Vec<_>>();
    let data = TypedArray::from_values(compound_dtype()?, &[COMPOUND_RECORDS], &records)?;
    let dataset = Dataset::from_data(data).with_options(DatasetOptions::chunked(&[3]));
    Ok(File::new(
        "smpl_compound_chunked.hdf5",
        Group::new().with_member("CompoundChunked", dataset),
    ))
}
