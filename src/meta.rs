//! Free-form metadata: one small array per key under `meta/`.

use crate::error::{Result, SchemaError};
use crate::npy::header::Header;
use crate::npy::{read_unicode, ReadNpyError, ReadableElement, WritableElement};
use num_complex::Complex;
use std::collections::btree_map::{self, BTreeMap};
use std::io;

/// A single metadata value.
#[derive(Clone, Debug, PartialEq)]
pub enum MetaValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Float32(f32),
    Complex(Complex<f32>),
    Text(String),
}

impl From<bool> for MetaValue {
    fn from(v: bool) -> Self {
        MetaValue::Bool(v)
    }
}

impl From<i64> for MetaValue {
    fn from(v: i64) -> Self {
        MetaValue::Int(v)
    }
}

impl From<i32> for MetaValue {
    fn from(v: i32) -> Self {
        MetaValue::Int(v.into())
    }
}

impl From<f64> for MetaValue {
    fn from(v: f64) -> Self {
        MetaValue::Float(v)
    }
}

impl From<f32> for MetaValue {
    fn from(v: f32) -> Self {
        MetaValue::Float32(v)
    }
}

impl From<Complex<f32>> for MetaValue {
    fn from(v: Complex<f32>) -> Self {
        MetaValue::Complex(v)
    }
}

impl From<String> for MetaValue {
    fn from(v: String) -> Self {
        MetaValue::Text(v)
    }
}

impl From<&str> for MetaValue {
    fn from(v: &str) -> Self {
        MetaValue::Text(v.to_owned())
    }
}

impl MetaValue {
    /// Header and payload of the one-element member holding this value.
    pub(crate) fn encode(&self) -> io::Result<(Header, Vec<u8>)> {
        match self {
            MetaValue::Bool(v) => encode_one(v),
            MetaValue::Int(v) => encode_one(v),
            MetaValue::Float(v) => encode_one(v),
            MetaValue::Float32(v) => encode_one(v),
            MetaValue::Complex(v) => encode_one(v),
            MetaValue::Text(v) => {
                let strings = [v.as_str()];
                let mut payload = Vec::new();
                crate::npy::write_unicode(&strings, &mut payload)?;
                Ok((
                    Header::new(crate::npy::unicode_descriptor(&strings), vec![1]),
                    payload,
                ))
            }
        }
    }

    /// Decodes the first element of the member stored under `key`.
    ///
    /// Any integer width is widened to `Int`; unsigned 64-bit values must fit
    /// in an `i64`.
    pub(crate) fn decode(key: &str, header: &Header, payload: &[u8]) -> Result<MetaValue> {
        let unsupported = || SchemaError::MetaDescriptor {
            key: key.to_owned(),
            descr: header.type_descriptor.clone(),
        };
        let len = header.len().ok_or(ReadNpyError::LengthOverflow)?;
        if len == 0 {
            return Err(SchemaError::EmptyMeta(key.to_owned()).into());
        }
        // Skip the byte order character; the element readers check it.
        let kind = match &header.type_descriptor {
            py_literal::Value::String(descr) => descr.get(1..).unwrap_or_default(),
            _ => return Err(unsupported().into()),
        };
        let value = match kind {
            "b1" => MetaValue::Bool(first(header, payload, len)?),
            "i1" => MetaValue::Int(first::<i8>(header, payload, len)?.into()),
            "i2" => MetaValue::Int(first::<i16>(header, payload, len)?.into()),
            "i4" => MetaValue::Int(first::<i32>(header, payload, len)?.into()),
            "i8" => MetaValue::Int(first(header, payload, len)?),
            "u1" => MetaValue::Int(first::<u8>(header, payload, len)?.into()),
            "u2" => MetaValue::Int(first::<u16>(header, payload, len)?.into()),
            "u4" => MetaValue::Int(first::<u32>(header, payload, len)?.into()),
            "u8" => MetaValue::Int(
                i64::try_from(first::<u64>(header, payload, len)?).map_err(|_| unsupported())?,
            ),
            "f4" => MetaValue::Float32(first(header, payload, len)?),
            "f8" => MetaValue::Float(first(header, payload, len)?),
            "c8" => MetaValue::Complex(first(header, payload, len)?),
            kind if kind.starts_with('U') => {
                let strings = read_unicode(payload, &header.type_descriptor, len)
                    .map_err(ReadNpyError::from)?;
                MetaValue::Text(strings.into_iter().next().unwrap_or_default())
            }
            _ => return Err(unsupported().into()),
        };
        Ok(value)
    }
}

fn encode_one<T: WritableElement>(value: &T) -> io::Result<(Header, Vec<u8>)> {
    let mut payload = Vec::new();
    value.write(&mut payload)?;
    Ok((Header::new(T::type_descriptor(), vec![1]), payload))
}

/// Reads all `len` elements and keeps the first. The caller has checked that
/// there is one.
fn first<T: ReadableElement + Default>(header: &Header, payload: &[u8], len: usize) -> Result<T> {
    let values = T::read_to_end_exact_vec(payload, &header.type_descriptor, len)
        .map_err(ReadNpyError::from)?;
    Ok(values.into_iter().next().unwrap_or_default())
}

/// Metadata keyed by name, iterated in key order.
///
/// Keys are checked when the set is written: they must be non-empty and may
/// not contain `/`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Meta(BTreeMap<String, MetaValue>);

impl Meta {
    pub fn new() -> Meta {
        Meta::default()
    }

    /// Inserts a value, returning the one it replaced.
    pub fn insert<K, V>(&mut self, key: K, value: V) -> Option<MetaValue>
    where
        K: Into<String>,
        V: Into<MetaValue>,
    {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, MetaValue> {
        self.0.iter()
    }
}

impl<K, V> FromIterator<(K, V)> for Meta
where
    K: Into<String>,
    V: Into<MetaValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Meta(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl IntoIterator for Meta {
    type Item = (String, MetaValue);
    type IntoIter = btree_map::IntoIter<String, MetaValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Meta {
    type Item = (&'a String, &'a MetaValue);
    type IntoIter = btree_map::Iter<'a, String, MetaValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
