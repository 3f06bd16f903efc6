//! Single-array `.npy` members.
//!
//! Every element is written little-endian regardless of the host, so a
//! container produced on any machine has the same bytes. Big-endian members
//! written by other tools are still readable.

mod elements;
pub mod header;

pub use self::elements::{read_unicode, unicode_descriptor, write_unicode};
pub use self::elements::{ReadDataError, ReadableElement, WritableElement};
use self::header::{Header, ParseHeaderError, ReadHeaderError, WriteHeaderError};
use ndarray::prelude::*;
use ndarray::{Data, DataOwned, IxDyn, ShapeError};
use py_literal::FormatError as PyValueFormatError;
use std::io;
use std::mem;
use thiserror::Error;

/// An error writing a `.npy` member.
#[derive(Debug, Error)]
pub enum WriteNpyError {
    /// An error caused by I/O.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// An error formatting the header.
    #[error("error formatting header: {0}")]
    FormatHeader(#[from] PyValueFormatError),
}

impl From<WriteHeaderError> for WriteNpyError {
    fn from(err: WriteHeaderError) -> WriteNpyError {
        match err {
            WriteHeaderError::Io(err) => WriteNpyError::Io(err),
            WriteHeaderError::Format(err) => WriteNpyError::FormatHeader(err),
        }
    }
}

/// An error reading a `.npy` member.
#[derive(Debug, Error)]
pub enum ReadNpyError {
    /// An error caused by I/O.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// An error parsing the file header.
    #[error("error parsing header: {0}")]
    ParseHeader(#[from] ParseHeaderError),
    /// An error reading the element data.
    #[error("error reading data: {0}")]
    ReadData(#[from] ReadDataError),
    /// Overflow while computing the length of the array (in units of bytes
    /// or the number of elements) from the shape described in the header.
    #[error("overflow computing length from shape")]
    LengthOverflow,
    /// The array has a different number of dimensions than the caller asked
    /// for.
    #[error("ndim {actual} of array did not match the requested ndim {expected:?}")]
    WrongNdim {
        expected: Option<usize>,
        actual: usize,
    },
    /// An error caused by incorrect array length or ndim.
    #[error("data did not match shape in header: {0}")]
    Shape(#[from] ShapeError),
}

impl From<ReadHeaderError> for ReadNpyError {
    fn from(err: ReadHeaderError) -> ReadNpyError {
        match err {
            ReadHeaderError::Io(err) => ReadNpyError::Io(err),
            ReadHeaderError::Parse(err) => ReadNpyError::ParseHeader(err),
        }
    }
}

/// Extension trait for writing an `ArrayBase` as a `.npy` member.
pub trait WriteNpyExt {
    /// Writes the array to `writer` in [`.npy`
    /// format](https://numpy.org/doc/stable/reference/generated/numpy.lib.format.html).
    fn write_npy<W: io::Write>(&self, writer: W) -> Result<(), WriteNpyError>;
}

impl<A, S, D> WriteNpyExt for ArrayBase<S, D>
where
    A: WritableElement,
    S: Data<Elem = A>,
    D: Dimension,
{
    fn write_npy<W: io::Write>(&self, mut writer: W) -> Result<(), WriteNpyError> {
        let header = |fortran_order| Header {
            type_descriptor: A::type_descriptor(),
            fortran_order,
            shape: self.shape().to_owned(),
        };
        if let Some(slice) = self.as_slice() {
            header(false).write(&mut writer)?;
            A::write_slice(slice, &mut writer)?;
        } else if let Some(slice) = self.t().to_slice() {
            header(true).write(&mut writer)?;
            A::write_slice(slice, &mut writer)?;
        } else {
            header(false).write(&mut writer)?;
            for elem in self.iter() {
                elem.write(&mut writer)?;
            }
        }
        Ok(())
    }
}

/// Extension trait for reading an owned array from a `.npy` member.
pub trait ReadNpyExt: Sized {
    /// Reads the array from `reader` in [`.npy`
    /// format](https://numpy.org/doc/stable/reference/generated/numpy.lib.format.html).
    fn read_npy<R: io::Read>(reader: R) -> Result<Self, ReadNpyError>;
}

impl<A, S, D> ReadNpyExt for ArrayBase<S, D>
where
    A: ReadableElement,
    S: DataOwned<Elem = A>,
    D: Dimension,
{
    fn read_npy<R: io::Read>(mut reader: R) -> Result<Self, ReadNpyError> {
        let header = Header::from_reader(&mut reader)?;
        let ndim = header.shape.len();
        if let Some(expected) = D::NDIM {
            if expected != ndim {
                return Err(ReadNpyError::WrongNdim {
                    expected: D::NDIM,
                    actual: ndim,
                });
            }
        }
        let len = element_count::<A>(&header.shape).ok_or(ReadNpyError::LengthOverflow)?;
        let data = A::read_to_end_exact_vec(&mut reader, &header.type_descriptor, len)?;
        let shape = IxDyn(&header.shape).set_f(header.fortran_order);
        Ok(ArrayBase::<S, IxDyn>::from_shape_vec(shape, data)?.into_dimensionality()?)
    }
}

/// Number of elements for `shape`, or `None` if the element count or the
/// byte count overflows.
fn element_count<A>(shape: &[usize]) -> Option<usize> {
    let len = shape
        .iter()
        .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))?;
    let num_bytes = len.checked_mul(mem::size_of::<A>())?;
    if num_bytes > isize::MAX as usize {
        return None;
    }
    Some(len)
}

/// Reads the header and the undecoded payload of a member.
pub(crate) fn read_raw<R: io::Read>(mut reader: R) -> Result<(Header, Vec<u8>), ReadNpyError> {
    let header = Header::from_reader(&mut reader)?;
    let mut payload = Vec::new();
    reader.read_to_end(&mut payload)?;
    Ok((header, payload))
}
