//! Encoding and decoding of array elements.

use py_literal::Value as PyValue;
use std::error::Error;
use std::io::{self, Read};
use thiserror::Error;

mod complex;
mod primitive;
mod unicode;

pub use self::unicode::{read_unicode, unicode_descriptor, write_unicode};

/// An array element type that can be written to a `.npy` member.
pub trait WritableElement: Sized {
    /// The `descr` written to the header.
    ///
    /// Always the little-endian descriptor, matching the bytes produced by
    /// `write` and `write_slice`.
    fn type_descriptor() -> PyValue;

    /// Writes a single instance of `Self` to the writer.
    fn write<W: io::Write>(&self, writer: W) -> io::Result<()> {
        Self::write_slice(std::slice::from_ref(self), writer)
    }

    /// Writes a slice of `Self` to the writer.
    fn write_slice<W: io::Write>(slice: &[Self], writer: W) -> io::Result<()>;
}

/// An array element type that can be read from a `.npy` member.
pub trait ReadableElement: Sized {
    /// Reads exactly `len` elements from `reader` and checks that the reader
    /// is exhausted afterwards.
    fn read_to_end_exact_vec<R: io::Read>(
        reader: R,
        type_desc: &PyValue,
        len: usize,
    ) -> Result<Vec<Self>, ReadDataError>;
}

/// An error reading array data.
#[derive(Debug, Error)]
pub enum ReadDataError {
    /// An error caused by I/O.
    #[error("I/O error: {0}")]
    Io(io::Error),
    /// The type descriptor does not match the element type.
    #[error("incorrect descriptor ({0}) for this type")]
    WrongDescriptor(PyValue),
    /// The file does not contain all the data described in the header.
    #[error("reached EOF before reading all data")]
    MissingData,
    /// Extra bytes are present between the end of the data and the end of
    /// the file.
    #[error("file had {0} extra bytes before EOF")]
    ExtraBytes(usize),
    /// An error parsing the data.
    #[error("error parsing data: {0}")]
    ParseData(Box<dyn Error + Send + Sync>),
}

impl From<io::Error> for ReadDataError {
    /// Performs the conversion.
    ///
    /// If the error kind is `UnexpectedEof`, the `MissingData` variant is
    /// returned. Otherwise, the `Io` variant is returned.
    fn from(err: io::Error) -> ReadDataError {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            ReadDataError::MissingData
        } else {
            ReadDataError::Io(err)
        }
    }
}

/// Returns `Ok(_)` iff the `reader` had no more bytes on entry to this
/// function.
///
/// **Warning** This will consume the remainder of the reader.
fn check_for_extra_bytes<R: io::Read>(reader: &mut R) -> Result<(), ReadDataError> {
    let num_extra_bytes = reader.read_to_end(&mut Vec::new())?;
    if num_extra_bytes == 0 {
        Ok(())
    } else {
        Err(ReadDataError::ExtraBytes(num_extra_bytes))
    }
}

/// Reads the `len` elements of `elem_size` bytes each that make up the rest
/// of `reader`.
///
/// The buffer grows with the data actually read, so a header claiming a huge
/// shape fails with `MissingData` instead of allocating up front.
fn read_payload<R: io::Read>(
    reader: &mut R,
    len: usize,
    elem_size: usize,
) -> Result<Vec<u8>, ReadDataError> {
    let num_bytes = len
        .checked_mul(elem_size)
        .filter(|&n| n <= isize::MAX as usize)
        .ok_or(ReadDataError::MissingData)?;
    let mut buf = Vec::new();
    reader
        .by_ref()
        .take(u64::try_from(num_bytes).unwrap_or(u64::MAX))
        .read_to_end(&mut buf)?;
    if buf.len() < num_bytes {
        return Err(ReadDataError::MissingData);
    }
    check_for_extra_bytes(reader)?;
    Ok(buf)
}

/// Returns the descriptor string if `type_desc` is a plain string.
fn descriptor_str(type_desc: &PyValue) -> Option<&str> {
    match type_desc {
        PyValue::String(s) => Some(s),
        _ => None,
    }
}
