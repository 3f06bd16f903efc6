use super::{descriptor_str, read_payload};
use crate::npy::{ReadDataError, ReadableElement, WritableElement};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use num_complex::Complex;
use py_literal::Value as PyValue;
use std::io;
use std::mem;

/// Complex values are stored as interleaved `(re, im)` pairs of the inner
/// float type.
macro_rules! impl_complex_multi_byte {
    ($inner:ty, $little_desc:literal, $big_desc:literal, $read_into:ident, $write_into:ident) => {
        impl WritableElement for Complex<$inner> {
            fn type_descriptor() -> PyValue {
                PyValue::String($little_desc.into())
            }

            fn write_slice<W: io::Write>(slice: &[Self], mut writer: W) -> io::Result<()> {
                let parts: Vec<$inner> = slice.iter().flat_map(|c| [c.re, c.im]).collect();
                let mut buf = vec![0; parts.len() * mem::size_of::<$inner>()];
                LittleEndian::$write_into(&parts, &mut buf);
                writer.write_all(&buf)
            }
        }

        impl ReadableElement for Complex<$inner> {
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
                let bytes = read_payload(&mut reader, len, mem::size_of::<Self>())?;
                let mut parts: Vec<$inner> = vec![0.; bytes.len() / mem::size_of::<$inner>()];
                if big_endian {
                    BigEndian::$read_into(&bytes, &mut parts);
                } else {
                    LittleEndian::$read_into(&bytes, &mut parts);
                }
                Ok(parts
                    .chunks_exact(2)
                    .map(|pair| Complex::new(pair[0], pair[1]))
                    .collect())
            }
        }
    };
}

impl_complex_multi_byte!(f32, "<c8", ">c8", read_f32_into, write_f32_into);
impl_complex_multi_byte!(f64, "<c16", ">c16", read_f64_into, write_f64_into);
