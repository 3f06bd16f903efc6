//! Trait implementations for primitive element types.

use super::{descriptor_str, read_payload};
use crate::npy::{ReadDataError, ReadableElement, WritableElement};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use py_literal::Value as PyValue;
use std::io;
use std::mem;
use thiserror::Error;

macro_rules! impl_primitive_multi_byte {
    ($elem:ty, $little_desc:literal, $big_desc:literal, $zero:expr, $read_into:ident, $write_into:ident) => {
        impl WritableElement for $elem {
            fn type_descriptor() -> PyValue {
                PyValue::String($little_desc.into())
            }

            fn write_slice<W: io::Write>(slice: &[Self], mut writer: W) -> io::Result<()> {
                let mut buf = vec![0; slice.len() * mem::size_of::<$elem>()];
                LittleEndian::$write_into(slice, &mut buf);
                writer.write_all(&buf)
            }
        }

        impl ReadableElement for $elem {
            fn read_to_end_exact_vec<R: io::Read>(
                mut reader: R,
                type_desc: &PyValue,
                len: usize,
            ) -> Result<Vec<Self>, ReadDataError> {
                let big_endian = match descriptor_str(type_desc) {
                    Some($little_desc) => false,
                    Some($big_desc) => true,
                    _ => return Err(ReadDataError::WrongDescriptor(type_desc.clone())),
                };
                let bytes = read_payload(&mut reader, len, mem::size_of::<$elem>())?;
                let mut out = vec![$zero; len];
                if big_endian {
                    BigEndian::$read_into(&bytes, &mut out);
                } else {
                    LittleEndian::$read_into(&bytes, &mut out);
                }
                Ok(out)
            }
        }
    };
}

impl_primitive_multi_byte!(i16, "<i2", ">i2", 0, read_i16_into, write_i16_into);
impl_primitive_multi_byte!(i32, "<i4", ">i4", 0, read_i32_into, write_i32_into);
impl_primitive_multi_byte!(i64, "<i8", ">i8", 0, read_i64_into, write_i64_into);

impl_primitive_multi_byte!(u16, "<u2", ">u2", 0, read_u16_into, write_u16_into);
impl_primitive_multi_byte!(u32, "<u4", ">u4", 0, read_u32_into, write_u32_into);
impl_primitive_multi_byte!(u64, "<u8", ">u8", 0, read_u64_into, write_u64_into);

impl_primitive_multi_byte!(f32, "<f4", ">f4", 0., read_f32_into, write_f32_into);
impl_primitive_multi_byte!(f64, "<f8", ">f8", 0., read_f64_into, write_f64_into);

impl WritableElement for u8 {
    fn type_descriptor() -> PyValue {
        PyValue::String("|u1".into())
    }

    fn write_slice<W: io::Write>(slice: &[Self], mut writer: W) -> io::Result<()> {
        writer.write_all(slice)
    }
}

impl ReadableElement for u8 {
    fn read_to_end_exact_vec<R: io::Read>(
        mut reader: R,
        type_desc: &PyValue,
        len: usize,
    ) -> Result<Vec<Self>, ReadDataError> {
        match descriptor_str(type_desc) {
            Some("|u1") | Some("u1") | Some("B") => read_payload(&mut reader, len, 1),
            _ => Err(ReadDataError::WrongDescriptor(type_desc.clone())),
        }
    }
}

impl WritableElement for i8 {
    fn type_descriptor() -> PyValue {
        PyValue::String("|i1".into())
    }

    fn write_slice<W: io::Write>(slice: &[Self], mut writer: W) -> io::Result<()> {
        let buf: Vec<u8> = slice.iter().map(|&x| x as u8).collect();
        writer.write_all(&buf)
    }
}

impl ReadableElement for i8 {
    fn read_to_end_exact_vec<R: io::Read>(
        mut reader: R,
        type_desc: &PyValue,
        len: usize,
    ) -> Result<Vec<Self>, ReadDataError> {
        match descriptor_str(type_desc) {
            Some("|i1") | Some("i1") | Some("b") => Ok(read_payload(&mut reader, len, 1)?
                .into_iter()
                .map(|byte| byte as i8)
                .collect()),
            _ => Err(ReadDataError::WrongDescriptor(type_desc.clone())),
        }
    }
}

/// An error parsing a `bool` from a byte.
#[derive(Debug, Error)]
#[error("error parsing value {bad_value:#04x} as a bool")]
struct ParseBoolError {
    bad_value: u8,
}

impl WritableElement for bool {
    fn type_descriptor() -> PyValue {
        PyValue::String("|b1".into())
    }

    fn write_slice<W: io::Write>(slice: &[Self], mut writer: W) -> io::Result<()> {
        let buf: Vec<u8> = slice.iter().map(|&b| u8::from(b)).collect();
        writer.write_all(&buf)
    }
}

impl ReadableElement for bool {
    fn read_to_end_exact_vec<R: io::Read>(
        mut reader: R,
        type_desc: &PyValue,
        len: usize,
    ) -> Result<Vec<Self>, ReadDataError> {
        match descriptor_str(type_desc) {
            Some("|b1") => {
                let bytes = read_payload(&mut reader, len, 1)?;
                bytes
                    .into_iter()
                    .map(|byte| match byte {
                        0 => Ok(false),
                        1 => Ok(true),
                        bad_value => Err(ReadDataError::ParseData(Box::new(ParseBoolError {
                            bad_value,
                        }))),
                    })
                    .collect()
            }
            _ => Err(ReadDataError::WrongDescriptor(type_desc.clone())),
        }
    }
}
