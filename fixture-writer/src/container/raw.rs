//! Calls into the HDF5 C library for the capabilities the safe `hdf5` crate does not
//! expose: element types with an explicit byte order, multidimensional array members,
//! committed types, and storing pre-encoded payloads without conversion.
//!
//! Every call is made while holding the `hdf5` crate's global lock, so these functions
//! can be freely mixed with the safe API from any thread. Failed calls are reported
//! with the library's own error stack, as the safe API reports them.
use super::DatasetLayout;
use crate::model::{ByteOrder, DatasetOptions, ElementType, NumberKind, TypedArray};
use hdf5::{h5check, sync::sync};
use hdf5_sys::{
    h5::{herr_t, hsize_t},
    h5a::{H5Acreate2, H5Adelete, H5Aexists, H5Awrite},
    h5d::{H5Dcreate2, H5Dwrite},
    h5i::{H5Idec_ref, hid_t},
    h5p::{
        H5P_CLS_DATASET_CREATE, H5P_DEFAULT, H5Pcreate, H5Pset_chunk, H5Pset_fill_value,
        H5Pset_fletcher32, H5Pset_shuffle,
    },
    h5s::{H5S_ALL, H5S_class_t, H5Screate, H5Screate_simple},
    h5t::{
        H5T_C_S1, H5T_IEEE_F32BE, H5T_IEEE_F32LE, H5T_IEEE_F64BE, H5T_IEEE_F64LE, H5T_STD_I8BE,
        H5T_STD_I8LE, H5T_STD_I16BE, H5T_STD_I16LE, H5T_STD_I32BE, H5T_STD_I32LE, H5T_STD_I64BE,
        H5T_STD_I64LE, H5T_STD_U8BE, H5T_STD_U8LE, H5T_STD_U16BE, H5T_STD_U16LE, H5T_STD_U32BE,
        H5T_STD_U32LE, H5T_STD_U64BE, H5T_STD_U64LE, H5T_class_t, H5T_str_t, H5Tarray_create2,
        H5Tcommit2, H5Tcopy, H5Tcreate, H5Tinsert, H5Tset_size, H5Tset_strpad,
    },
};
use std::{
    ffi::{CStr, CString, c_int, c_uint},
    ptr,
};

/// An identifier owned by this crate, released when dropped.
#[derive(Debug)]
pub(crate) struct OwnedId(hid_t);

impl OwnedId {
    fn new(id: hid_t) -> hdf5::Result<Self> {
        h5check(id).map(Self)
    }

    pub(crate) fn id(&self) -> hid_t {
        self.0
    }
}

impl Drop for OwnedId {
    fn drop(&mut self) {
        // SAFETY: the identifier was valid when created and is released exactly once.
        sync(|| unsafe { H5Idec_ref(self.0) });
    }
}

fn check(status: herr_t) -> hdf5::Result<()> {
    h5check(status).map(|_| ())
}

fn to_hsize(dims: &[usize]) -> Vec<hsize_t> {
    dims.iter().map(|&dim| dim as hsize_t).collect()
}

fn rank<T: TryFrom<usize>>(dims: &[hsize_t]) -> hdf5::Result<T> {
    T::try_from(dims.len()).map_err(|_| hdf5::Error::from("rank out of range"))
}

pub(crate) fn c_name(name: &str) -> Result<CString, std::ffi::NulError> {
    CString::new(name)
}

fn number_type(kind: NumberKind, order: ByteOrder) -> hid_t {
    let big = order == ByteOrder::Big;
    let id = match (kind, big) {
        (NumberKind::I8, false) => &H5T_STD_I8LE,
        (NumberKind::I8, true) => &H5T_STD_I8BE,
        (NumberKind::I16, false) => &H5T_STD_I16LE,
        (NumberKind::I16, true) => &H5T_STD_I16BE,
        (NumberKind::I32, false) => &H5T_STD_I32LE,
        (NumberKind::I32, true) => &H5T_STD_I32BE,
        (NumberKind::I64, false) => &H5T_STD_I64LE,
        (NumberKind::I64, true) => &H5T_STD_I64BE,
        (NumberKind::U8, false) => &H5T_STD_U8LE,
        (NumberKind::U8, true) => &H5T_STD_U8BE,
        (NumberKind::U16, false) => &H5T_STD_U16LE,
        (NumberKind::U16, true) => &H5T_STD_U16BE,
        (NumberKind::U32, false) => &H5T_STD_U32LE,
        (NumberKind::U32, true) => &H5T_STD_U32BE,
        (NumberKind::U64, false) => &H5T_STD_U64LE,
        (NumberKind::U64, true) => &H5T_STD_U64BE,
        (NumberKind::F32, false) => &H5T_IEEE_F32LE,
        (NumberKind::F32, true) => &H5T_IEEE_F32BE,
        (NumberKind::F64, false) => &H5T_IEEE_F64LE,
        (NumberKind::F64, true) => &H5T_IEEE_F64BE,
    };
    **id
}

// SAFETY (all blocks below): every identifier passed is a live `OwnedId` or a
// library predefined type, and every name is a nul terminated `CString` that
// outlives the call.

/// Builds a transient file type matching `dtype` byte for byte.
pub(crate) fn build_type(dtype: &ElementType) -> hdf5::Result<OwnedId> {
    sync(|| match dtype {
        ElementType::Number { kind, order } => {
            OwnedId::new(unsafe { H5Tcopy(number_type(*kind, *order)) })
        }
        ElementType::FixedAscii(width) => {
            let string = OwnedId::new(unsafe { H5Tcopy(*H5T_C_S1) })?;
            check(unsafe { H5Tset_size(string.id(), *width) })?;
            check(unsafe { H5Tset_strpad(string.id(), H5T_str_t::H5T_STR_NULLPAD) })?;
            Ok(string)
        }
        ElementType::Array { base, dims } => {
            let base = build_type(base)?;
            let dims = to_hsize(dims);
            let rank: c_uint = rank(&dims)?;
            // SAFETY: `dims` holds exactly `rank` extents.
            OwnedId::new(unsafe { H5Tarray_create2(base.id(), rank, dims.as_ptr()) })
        }
        ElementType::Compound(fields) => {
            let compound =
                OwnedId::new(unsafe { H5Tcreate(H5T_class_t::H5T_COMPOUND, dtype.size()) })?;
            for (field, offset) in fields.iter().zip(dtype.offsets()) {
                let member = build_type(&field.dtype)?;
                let name = c_name(&field.name).map_err(|e| hdf5::Error::from(e.to_string()))?;
                check(unsafe { H5Tinsert(compound.id(), name.as_ptr(), offset, member.id()) })?;
            }
            Ok(compound)
        }
    })
}

fn dataspace(shape: &[usize]) -> hdf5::Result<OwnedId> {
    sync(|| {
        if shape.is_empty() {
            return OwnedId::new(unsafe { H5Screate(H5S_class_t::H5S_SCALAR) });
        }
        let dims = to_hsize(shape);
        let rank: c_int = rank(&dims)?;
        // SAFETY: `dims` holds exactly `rank` extents, and a null maximum means fixed size.
        OwnedId::new(unsafe { H5Screate_simple(rank, dims.as_ptr(), ptr::null()) })
    })
}

fn dataset_create_plist(options: &DatasetOptions, dtype: &OwnedId) -> hdf5::Result<OwnedId> {
    sync(|| {
        let plist = OwnedId::new(unsafe { H5Pcreate(*H5P_CLS_DATASET_CREATE) })?;
        if let Some(chunks) = &options.chunks {
            let dims = to_hsize(chunks);
            let rank: c_int = rank(&dims)?;
            check(unsafe { H5Pset_chunk(plist.id(), rank, dims.as_ptr()) })?;
        }
        if options.shuffle {
            check(unsafe { H5Pset_shuffle(plist.id()) })?;
        }
        if options.fletcher32 {
            check(unsafe { H5Pset_fletcher32(plist.id()) })?;
        }
        if let Some(fill_value) = &options.fill_value {
            ensure_payload_size(fill_value, 1)?;
            // SAFETY: the buffer holds exactly one element of `dtype`, checked above.
            check(unsafe {
                H5Pset_fill_value(plist.id(), dtype.id(), fill_value.as_bytes().as_ptr().cast())
            })?;
        }
        Ok(plist)
    })
}

/// Guards every read the library makes from a payload buffer.
fn ensure_payload_size(array: &TypedArray, elements: usize) -> hdf5::Result<()> {
    let expected = elements * array.dtype().size();
    if array.as_bytes().len() == expected {
        Ok(())
    } else {
        Err(hdf5::Error::from(format!(
            "payload holds {} bytes, expected {expected}",
            array.as_bytes().len()
        )))
    }
}

/// Creates a dataset at `name` in `loc` and stores its payload, if it has one.
pub(crate) fn create_dataset(
    loc: hid_t,
    name: &CStr,
    layout: &DatasetLayout<'_>,
) -> hdf5::Result<OwnedId> {
    sync(|| {
        let dtype = build_type(layout.dtype)?;
        let space = dataspace(&layout.shape)?;
        let plist = dataset_create_plist(layout.options, &dtype)?;
        let dataset = OwnedId::new(unsafe {
            H5Dcreate2(
                loc,
                name.as_ptr(),
                dtype.id(),
                space.id(),
                H5P_DEFAULT,
                plist.id(),
                H5P_DEFAULT,
            )
        })?;
        if let Some(data) = layout.data.filter(|data| !data.is_empty()) {
            ensure_payload_size(data, layout.shape.iter().product())?;
            // SAFETY: the memory type is the file type and the buffer holds exactly one
            // element of it per point of the dataspace, checked above.
            check(unsafe {
                H5Dwrite(
                    dataset.id(),
                    dtype.id(),
                    H5S_ALL,
                    H5S_ALL,
                    H5P_DEFAULT,
                    data.as_bytes().as_ptr().cast(),
                )
            })?;
        }
        Ok(dataset)
    })
}

/// Commits `dtype` under `name` in `loc`, returning the committed type.
pub(crate) fn commit_type(loc: hid_t, name: &CStr, dtype: &ElementType) -> hdf5::Result<OwnedId> {
    sync(|| {
        let datatype = build_type(dtype)?;
        check(unsafe {
            H5Tcommit2(
                loc,
                name.as_ptr(),
                datatype.id(),
                H5P_DEFAULT,
                H5P_DEFAULT,
                H5P_DEFAULT,
            )
        })?;
        Ok(datatype)
    })
}

/// Creates the attribute `name` on the object `loc` and stores `value` in it,
/// replacing any attribute already stored under that name.
pub(crate) fn write_attribute(loc: hid_t, name: &CStr, value: &TypedArray) -> hdf5::Result<()> {
    sync(|| {
        let exists = h5check(unsafe { H5Aexists(loc, name.as_ptr()) })?;
        if exists > 0 {
            check(unsafe { H5Adelete(loc, name.as_ptr()) })?;
        }
        let dtype = build_type(value.dtype())?;
        let space = dataspace(value.shape())?;
        let attribute = OwnedId::new(unsafe {
            H5Acreate2(
                loc,
                name.as_ptr(),
                dtype.id(),
                space.id(),
                H5P_DEFAULT,
                H5P_DEFAULT,
            )
        })?;
        if !value.is_empty() {
            ensure_payload_size(value, value.len())?;
            // SAFETY: the memory type is the file type and the buffer holds exactly
            // `value.len()` elements of it, checked above.
            check(unsafe {
                H5Awrite(attribute.id(), dtype.id(), value.as_bytes().as_ptr().cast())
            })?;
        }
        Ok(())
    })
}
