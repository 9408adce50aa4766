//! Element type descriptors, in the spirit of NumPy dtypes.
//!
//! An [ElementType] describes exactly how one element is laid out in bytes,
//! including its byte order, so that payloads can be handed to the container
//! library verbatim.
use super::Value;
use crate::error::FixtureError;
use itertools::Itertools;
use std::{fmt, str::FromStr};
use strum::Display;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum EncodeError {
    #[error("Cannot store {found} value in element of type {dtype}")]
    TypeMismatch { dtype: String, found: &'static str },
    #[error("Value {value} out of range for element of type {dtype}")]
    OutOfRange { value: String, dtype: String },
    #[error("Expected {expected} values for element of type {dtype}, found {found}")]
    LengthMismatch {
        dtype: String,
        expected: usize,
        found: usize,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ByteOrder {
    Little,
    Big,
    /// Only meaningful for single byte elements.
    NotApplicable,
}

impl ByteOrder {
    pub(crate) fn native() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }

    fn prefix(self) -> char {
        match self {
            ByteOrder::Little => '<',
            ByteOrder::Big => '>',
            ByteOrder::NotApplicable => '|',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum NumberKind {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl NumberKind {
    pub(crate) fn size(self) -> usize {
        match self {
            NumberKind::I8 | NumberKind::U8 => 1,
            NumberKind::I16 | NumberKind::U16 => 2,
            NumberKind::I32 | NumberKind::U32 | NumberKind::F32 => 4,
            NumberKind::I64 | NumberKind::U64 | NumberKind::F64 => 8,
        }
    }

    fn letter(self) -> char {
        match self {
            NumberKind::I8 | NumberKind::I16 | NumberKind::I32 | NumberKind::I64 => 'i',
            NumberKind::U8 | NumberKind::U16 | NumberKind::U32 | NumberKind::U64 => 'u',
            NumberKind::F32 | NumberKind::F64 => 'f',
        }
    }

    fn from_letter(letter: char, size: usize) -> Option<Self> {
        Some(match (letter, size) {
            ('i', 1) => NumberKind::I8,
            ('i', 2) => NumberKind::I16,
            ('i', 4) => NumberKind::I32,
            ('i', 8) => NumberKind::I64,
            ('u', 1) => NumberKind::U8,
            ('u', 2) => NumberKind::U16,
            ('u', 4) => NumberKind::U32,
            ('u', 8) => NumberKind::U64,
            ('f', 4) => NumberKind::F32,
            ('f', 8) => NumberKind::F64,
            _ => return None,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Field {
    pub(crate) name: String,
    pub(crate) dtype: ElementType,
}

impl Field {
    pub(crate) fn new(name: &str, dtype: ElementType) -> Self {
        Self {
            name: name.to_owned(),
            dtype,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ElementType {
    Number { kind: NumberKind, order: ByteOrder },
    /// Null padded byte string of fixed width.
    FixedAscii(usize),
    /// Fixed size, possibly multidimensional, array of `base`.
    Array {
        base: Box<ElementType>,
        dims: Vec<usize>,
    },
    /// Packed record, fields are laid out back to back.
    Compound(Vec<Field>),
}

impl ElementType {
    pub(crate) const fn number(kind: NumberKind, order: ByteOrder) -> Self {
        ElementType::Number { kind, order }
    }

    pub(crate) fn array(base: ElementType, dims: &[usize]) -> Self {
        ElementType::Array {
            base: Box::new(base),
            dims: dims.to_vec(),
        }
    }

    /// Number of bytes one element occupies.
    pub(crate) fn size(&self) -> usize {
        match self {
            ElementType::Number { kind, .. } => kind.size(),
            ElementType::FixedAscii(width) => *width,
            ElementType::Array { base, dims } => base.size() * dims.iter().product::<usize>(),
            ElementType::Compound(fields) => fields.iter().map(|field| field.dtype.size()).sum(),
        }
    }

    /// Byte offsets of each field of a compound type, empty for all other types.
    pub(crate) fn offsets(&self) -> Vec<usize> {
        match self {
            ElementType::Compound(fields) => fields
                .iter()
                .scan(0, |offset, field| {
                    let this = *offset;
                    *offset += field.dtype.size();
                    Some(this)
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Appends the encoding of `value` to `out`.
    /// # Error Modes
    /// - [EncodeError::TypeMismatch] if the value's variant cannot be stored in this type.
    /// - [EncodeError::OutOfRange] if an integer value does not fit.
    /// - [EncodeError::LengthMismatch] if a list or record has the wrong number of entries.
    pub(crate) fn encode(&self, value: &Value, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        match self {
            ElementType::Number { kind, order } => self.encode_number(*kind, *order, value, out),
            ElementType::FixedAscii(width) => {
                let Value::Bytes(bytes) = value else {
                    return Err(self.type_mismatch(value));
                };
                let kept = bytes.iter().take(*width);
                out.extend(kept.chain(std::iter::repeat(&0u8)).take(*width));
                Ok(())
            }
            ElementType::Array { base, dims } => {
                let Value::List(values) = value else {
                    return Err(self.type_mismatch(value));
                };
                self.expect_len(dims.iter().product(), values.len())?;
                values.iter().try_for_each(|value| base.encode(value, out))
            }
            ElementType::Compound(fields) => {
                let Value::Record(values) = value else {
                    return Err(self.type_mismatch(value));
                };
                self.expect_len(fields.len(), values.len())?;
                fields
                    .iter()
                    .zip(values)
                    .try_for_each(|(field, value)| field.dtype.encode(value, out))
            }
        }
    }

    fn encode_number(
        &self,
        kind: NumberKind,
        order: ByteOrder,
        value: &Value,
        out: &mut Vec<u8>,
    ) -> Result<(), EncodeError> {
        macro_rules! put {
            ($value:expr) => {{
                let value = $value;
                match order {
                    ByteOrder::Big => out.extend_from_slice(&value.to_be_bytes()),
                    ByteOrder::Little | ByteOrder::NotApplicable => {
                        out.extend_from_slice(&value.to_le_bytes())
                    }
                }
            }};
        }
        match kind {
            NumberKind::I8 => put!(self.integer::<i8>(value)?),
            NumberKind::I16 => put!(self.integer::<i16>(value)?),
            NumberKind::I32 => put!(self.integer::<i32>(value)?),
            NumberKind::I64 => put!(self.integer::<i64>(value)?),
            NumberKind::U8 => put!(self.integer::<u8>(value)?),
            NumberKind::U16 => put!(self.integer::<u16>(value)?),
            NumberKind::U32 => put!(self.integer::<u32>(value)?),
            NumberKind::U64 => put!(self.integer::<u64>(value)?),
            NumberKind::F32 => put!(self.float(value)? as f32),
            NumberKind::F64 => put!(self.float(value)?),
        }
        Ok(())
    }

    fn integer<T>(&self, value: &Value) -> Result<T, EncodeError>
    where
        T: TryFrom<i64> + TryFrom<u64>,
    {
        let converted = match value {
            Value::Int(int) => <T as TryFrom<i64>>::try_from(*int).ok(),
            Value::UInt(uint) => <T as TryFrom<u64>>::try_from(*uint).ok(),
            _ => return Err(self.type_mismatch(value)),
        };
        converted.ok_or_else(|| EncodeError::OutOfRange {
            value: value.to_string(),
            dtype: self.to_string(),
        })
    }

    fn float(&self, value: &Value) -> Result<f64, EncodeError> {
        match value {
            Value::Float(float) => Ok(*float),
            Value::Int(int) => Ok(*int as f64),
            Value::UInt(uint) => Ok(*uint as f64),
            _ => Err(self.type_mismatch(value)),
        }
    }

    fn type_mismatch(&self, value: &Value) -> EncodeError {
        EncodeError::TypeMismatch {
            dtype: self.to_string(),
            found: value.kind_name(),
        }
    }

    fn expect_len(&self, expected: usize, found: usize) -> Result<(), EncodeError> {
        if expected == found {
            Ok(())
        } else {
            Err(EncodeError::LengthMismatch {
                dtype: self.to_string(),
                expected,
                found,
            })
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Number { kind, order } => {
                write!(f, "{}{}{}", order.prefix(), kind.letter(), kind.size())
            }
            ElementType::FixedAscii(width) => write!(f, "|S{width}"),
            ElementType::Array { base, dims } => match dims.as_slice() {
                [dim] => write!(f, "({dim},){base}"),
                dims => write!(f, "({}){base}", dims.iter().join(", ")),
            },
            ElementType::Compound(fields) => write!(
                f,
                "{{{}}}",
                fields
                    .iter()
                    .map(|field| format!("{}: {}", field.name, field.dtype))
                    .join(", ")
            ),
        }
    }
}

/// Parses NumPy style scalar type strings such as `"<i4"`, `">f8"` or `"|S18"`.
impl FromStr for ElementType {
    type Err = FixtureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FixtureError::InvalidDtype(s.to_owned());

        let mut chars = s.chars();
        let (order, rest) = match chars.next() {
            Some('<') => (Some(ByteOrder::Little), chars.as_str()),
            Some('>') => (Some(ByteOrder::Big), chars.as_str()),
            Some('|') => (Some(ByteOrder::NotApplicable), chars.as_str()),
            Some('=') => (None, chars.as_str()),
            _ => (None, s),
        };

        let mut chars = rest.chars();
        let letter = chars.next().ok_or_else(invalid)?;
        let size: usize = chars.as_str().parse().map_err(|_| invalid())?;

        if letter == 'S' {
            return (size > 0)
                .then_some(ElementType::FixedAscii(size))
                .ok_or_else(invalid);
        }
        let kind = NumberKind::from_letter(letter, size).ok_or_else(invalid)?;
        // Byte order is meaningless for single byte elements, whatever the prefix
        let order = match order {
            _ if kind.size() == 1 => ByteOrder::NotApplicable,
            Some(ByteOrder::NotApplicable) | None => ByteOrder::native(),
            Some(order) => order,
        };
        Ok(ElementType::Number { kind, order })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dtype(s: &str) -> ElementType {
        s.parse().unwrap()
    }

    #[test]
    fn parse_numpy_strings() {
        assert_eq!(
            dtype("<i4"),
            ElementType::number(NumberKind::I32, ByteOrder::Little)
        );
        assert_eq!(
            dtype(">f8"),
            ElementType::number(NumberKind::F64, ByteOrder::Big)
        );
        assert_eq!(
            dtype("|i1"),
            ElementType::number(NumberKind::I8, ByteOrder::NotApplicable)
        );
        assert_eq!(
            dtype("u1"),
            ElementType::number(NumberKind::U8, ByteOrder::NotApplicable)
        );
        assert_eq!(
            dtype("=u2"),
            ElementType::number(NumberKind::U16, ByteOrder::native())
        );
        assert_eq!(dtype("|S18"), ElementType::FixedAscii(18));
    }

    #[test]
    fn single_byte_types_ignore_order_prefix() {
        assert_eq!(dtype("<u1"), dtype("|u1"));
        assert_eq!(dtype(">i1"), dtype("|i1"));
        assert_eq!(dtype("=u1"), dtype("u1"));
        assert_eq!(dtype("<u1").to_string(), "|u1");
        assert_eq!(dtype("|i4"), dtype("=i4"));
    }

    #[test]
    fn reject_invalid_strings() {
        for s in ["", "<", "<i3", ">f2", "|S0", "<x4", "i4x", "S"] {
            assert!(
                matches!(s.parse::<ElementType>(), Err(FixtureError::InvalidDtype(_))),
                "{s:?} should not parse"
            );
        }
    }

    #[test]
    fn display_matches_parse() {
        for s in ["<i4", ">i2", "|u1", "<f4", ">f8", "|S6", ">u8"] {
            assert_eq!(dtype(s).to_string(), s);
        }
        assert_eq!(
            ElementType::array(dtype(">i2"), &[5, 10]).to_string(),
            "(5, 10)>i2"
        );
        assert_eq!(ElementType::array(dtype(">f8"), &[10]).to_string(), "(10,)>f8");
        let compound =
            ElementType::Compound(vec![Field::new("a", dtype("<i4")), Field::new("b", dtype("|S2"))]);
        assert_eq!(compound.to_string(), "{a: <i4, b: |S2}");
    }

    #[test]
    fn compound_size_and_offsets_are_packed() {
        let compound = ElementType::Compound(vec![
            Field::new("a", dtype(">i4")),
            Field::new("c", dtype("|S6")),
            Field::new("d", ElementType::array(dtype(">i2"), &[5, 10])),
            Field::new("g", dtype("<u1")),
        ]);
        assert_eq!(compound.size(), 4 + 6 + 100 + 1);
        assert_eq!(compound.offsets(), vec![0, 4, 10, 110]);
        assert!(dtype("<i4").offsets().is_empty());
    }

    #[test]
    fn encode_numbers_in_declared_order() {
        let mut out = Vec::new();
        dtype(">i4").encode(&Value::Int(1), &mut out).unwrap();
        dtype("<i4").encode(&Value::Int(1), &mut out).unwrap();
        dtype("|i1").encode(&Value::Int(-34), &mut out).unwrap();
        dtype(">f4").encode(&Value::Float(1.5), &mut out).unwrap();
        assert_eq!(
            out,
            vec![0, 0, 0, 1, 1, 0, 0, 0, 0xde, 0x3f, 0xc0, 0x00, 0x00]
        );
    }

    #[test]
    fn encode_range_and_type_checks() {
        let mut out = Vec::new();
        assert!(matches!(
            dtype("|u1").encode(&Value::Int(256), &mut out),
            Err(EncodeError::OutOfRange { .. })
        ));
        assert!(matches!(
            dtype("<u4").encode(&Value::Int(-1), &mut out),
            Err(EncodeError::OutOfRange { .. })
        ));
        assert!(matches!(
            dtype("<i4").encode(&Value::Float(1.0), &mut out),
            Err(EncodeError::TypeMismatch { .. })
        ));
        assert!(matches!(
            dtype("|S4").encode(&Value::Int(1), &mut out),
            Err(EncodeError::TypeMismatch { .. })
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn encode_strings_pads_and_truncates() {
        let mut out = Vec::new();
        dtype("|S4").encode(&Value::from("ab"), &mut out).unwrap();
        dtype("|S4").encode(&Value::from("abcdef"), &mut out).unwrap();
        assert_eq!(out, b"ab\0\0abcd");
    }

    #[test]
    fn encode_arrays_and_records() {
        let mut out = Vec::new();
        let array = ElementType::array(dtype(">i2"), &[2, 2]);
        array
            .encode(&Value::List((1..=4).map(Value::Int).collect()), &mut out)
            .unwrap();
        assert_eq!(out, vec![0, 1, 0, 2, 0, 3, 0, 4]);

        assert!(matches!(
            array.encode(&Value::List(vec![Value::Int(1)]), &mut out),
            Err(EncodeError::LengthMismatch {
                expected: 4,
                found: 1,
                ..
            })
        ));

        let record =
            ElementType::Compound(vec![Field::new("a", dtype("|u1")), Field::new("b", dtype("|S2"))]);
        let mut out = Vec::new();
        record
            .encode(&Value::Record(vec![Value::UInt(7), Value::from("x")]), &mut out)
            .unwrap();
        assert_eq!(out, vec![7, b'x', 0]);
    }
}
