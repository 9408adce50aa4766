use super::{ElementType, EncodeError};
use itertools::Itertools;
use std::fmt;

/// An untyped literal, given meaning by the [ElementType] it is encoded as.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Value {
    Int(i64),
    UInt(u64),
    Float(f64),
    Bytes(Vec<u8>),
    /// Elements of an array type, flattened in row-major order.
    List(Vec<Value>),
    /// Fields of a compound type, in field order.
    Record(Vec<Value>),
}

impl Value {
    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::UInt(_) => "unsigned integer",
            Value::Float(_) => "float",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Record(_) => "record",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(int) => write!(f, "{int}"),
            Value::UInt(uint) => write!(f, "{uint}"),
            Value::Float(float) => write!(f, "{float}"),
            Value::Bytes(bytes) => write!(f, "b\"{}\"", bytes.escape_ascii()),
            Value::List(values) => write!(f, "[{}]", values.iter().join(", ")),
            Value::Record(values) => write!(f, "({})", values.iter().join(", ")),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Bytes(value.as_bytes().to_vec())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

macro_rules! value_from_int {
    ($variant:ident: $($int:ty),*) => {
        $(impl From<$int> for Value {
            fn from(value: $int) -> Self {
                Value::$variant(value.into())
            }
        })*
    };
}

value_from_int!(Int: i8, i16, i32, i64);
value_from_int!(UInt: u8, u16, u32, u64);

/// A shaped array of encoded elements, ready to be stored as a dataset or attribute.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TypedArray {
    dtype: ElementType,
    shape: Vec<usize>,
    bytes: Vec<u8>,
}

impl TypedArray {
    /// Encodes `values` (row-major) into an array of the given shape.
    /// # Error Modes
    /// - [EncodeError::LengthMismatch] if the number of values does not match the shape.
    /// - Propagates errors from [ElementType::encode].
    pub(crate) fn from_values(
        dtype: ElementType,
        shape: &[usize],
        values: &[Value],
    ) -> Result<Self, EncodeError> {
        let expected = shape.iter().product();
        if values.len() != expected {
            return Err(EncodeError::LengthMismatch {
                dtype: dtype.to_string(),
                expected,
                found: values.len(),
            });
        }
        let mut bytes = Vec::with_capacity(expected * dtype.size());
        for value in values {
            dtype.encode(value, &mut bytes)?;
        }
        Ok(Self {
            dtype,
            shape: shape.to_vec(),
            bytes,
        })
    }

    pub(crate) fn scalar(dtype: ElementType, value: impl Into<Value>) -> Result<Self, EncodeError> {
        Self::from_values(dtype, &[], &[value.into()])
    }

    pub(crate) fn vector<V: Into<Value>>(
        dtype: ElementType,
        values: impl IntoIterator<Item = V>,
    ) -> Result<Self, EncodeError> {
        let values = values.into_iter().map(Into::into).collect::<Vec<_>>();
        Self::from_values(dtype, &[values.len()], &values)
    }

    pub(crate) fn dtype(&self) -> &ElementType {
        &self.dtype
    }

    pub(crate) fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of elements.
    pub(crate) fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}
