//! Fixed-width unicode strings (`<U{n}`): every string occupies `n` UTF-32
//! code units, zero padded.

use super::{descriptor_str, read_payload};
use crate::npy::ReadDataError;
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use py_literal::Value as PyValue;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid unicode scalar value {0:#x}")]
struct InvalidCodePoint(u32);

/// The descriptor for a string array wide enough to hold every string.
pub fn unicode_descriptor<S: AsRef<str>>(strings: &[S]) -> PyValue {
    PyValue::String(format!("<U{}", unicode_width(strings)))
}

/// Number of code units per element, at least 1.
fn unicode_width<S: AsRef<str>>(strings: &[S]) -> usize {
    strings
        .iter()
        .map(|s| s.as_ref().chars().count())
        .max()
        .unwrap_or(0)
        .max(1)
}

/// Writes the payload matching [`unicode_descriptor`] for the same strings.
pub fn write_unicode<S: AsRef<str>, W: io::Write>(strings: &[S], mut writer: W) -> io::Result<()> {
    let width = unicode_width(strings);
    let mut units = vec![0u32; width * strings.len()];
    for (s, slot) in strings.iter().zip(units.chunks_exact_mut(width)) {
        for (c, unit) in s.as_ref().chars().zip(slot.iter_mut()) {
            *unit = u32::from(c);
        }
    }
    let mut buf = vec![0; units.len() * 4];
    LittleEndian::write_u32_into(&units, &mut buf);
    writer.write_all(&buf)
}

/// Reads `len` strings of the width given by `type_desc`. Trailing NULs are
/// stripped.
pub fn read_unicode<R: io::Read>(
    mut reader: R,
    type_desc: &PyValue,
    len: usize,
) -> Result<Vec<String>, ReadDataError> {
    let (big_endian, width) = match descriptor_str(type_desc).and_then(parse_unicode_descr) {
        Some(parsed) => parsed,
        None => return Err(ReadDataError::WrongDescriptor(type_desc.clone())),
    };
    let count = width
        .checked_mul(len)
        .ok_or(ReadDataError::WrongDescriptor(type_desc.clone()))?;
    let bytes = read_payload(&mut reader, count, 4)?;
    let mut units = vec![0u32; count];
    if big_endian {
        BigEndian::read_u32_into(&bytes, &mut units);
    } else {
        LittleEndian::read_u32_into(&bytes, &mut units);
    }
    if width == 0 {
        return Ok(vec![String::new(); len]);
    }
    units
        .chunks_exact(width)
        .map(|slot| {
            slot.iter()
                .take_while(|&&unit| unit != 0)
                .map(|&unit| {
                    char::from_u32(unit)
                        .ok_or_else(|| ReadDataError::ParseData(Box::new(InvalidCodePoint(unit))))
                })
                .collect()
        })
        .collect()
}

/// Splits `<U12` / `>U12` / `=U12` / `U12` into (big endian, width).
fn parse_unicode_descr(descr: &str) -> Option<(bool, usize)> {
    let (big_endian, rest) = match descr.as_bytes().first()? {
        b'<' | b'=' | b'|' => (false, &descr[1..]),
        b'>' => (true, &descr[1..]),
        _ => (false, descr),
    };
    let width = rest.strip_prefix('U')?.parse().ok()?;
    Some((big_endian, width))
}
