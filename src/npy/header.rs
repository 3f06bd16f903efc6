use byteorder::{ByteOrder, LittleEndian};
use num_traits::ToPrimitive;
use py_literal::{
    FormatError as PyValueFormatError, ParseError as PyValueParseError, Value as PyValue,
};
use std::io;
use thiserror::Error;

/// Magic string to indicate npy format.
const MAGIC_STRING: &[u8] = b"\x93NUMPY";

/// Total header length (prefix + dictionary + newline) is padded to a
/// multiple of this value.
const HEADER_ALIGN: usize = 64;

#[derive(Debug, Error)]
pub enum ParseHeaderError {
    #[error("start does not match magic string")]
    MagicString,
    #[error("unknown version number: {major}.{minor}")]
    Version { major: u8, minor: u8 },
    /// The array format string contains non-ASCII characters, which versions
    /// 1.0 and 2.0 forbid.
    #[error("non-ascii in array format string; this is not supported in .npy format versions 1.0 and 2.0")]
    NonAscii,
    #[error("error parsing array format string as UTF-8: {0}")]
    Utf8Parse(#[from] std::str::Utf8Error),
    #[error("unknown key: {0}")]
    UnknownKey(PyValue),
    #[error("missing key: {0}")]
    MissingKey(&'static str),
    #[error("illegal value for key {key}: {value}")]
    IllegalValue { key: &'static str, value: PyValue },
    #[error("error parsing metadata dict: {0}")]
    DictParse(#[from] PyValueParseError),
    #[error("metadata is not a dict: {0}")]
    MetaNotDict(PyValue),
    #[error("newline missing at end of header")]
    MissingNewline,
}

#[derive(Debug, Error)]
pub enum ReadHeaderError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("error parsing header: {0}")]
    Parse(#[from] ParseHeaderError),
}

#[derive(Debug, Error)]
pub enum WriteHeaderError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("error formatting header: {0}")]
    Format(#[from] PyValueFormatError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Version {
    V1_0,
    V2_0,
    V3_0,
}

impl Version {
    /// Number of bytes taken up by version number (1 byte for major version, 1
    /// byte for minor version).
    const VERSION_NUM_BYTES: usize = 2;

    fn from_bytes(bytes: [u8; Self::VERSION_NUM_BYTES]) -> Result<Self, ParseHeaderError> {
        match bytes {
            [0x01, 0x00] => Ok(Version::V1_0),
            [0x02, 0x00] => Ok(Version::V2_0),
            [0x03, 0x00] => Ok(Version::V3_0),
            [major, minor] => Err(ParseHeaderError::Version { major, minor }),
        }
    }

    fn to_bytes(self) -> [u8; Self::VERSION_NUM_BYTES] {
        match self {
            Version::V1_0 => [0x01, 0x00],
            Version::V2_0 => [0x02, 0x00],
            Version::V3_0 => [0x03, 0x00],
        }
    }

    /// Number of bytes in representation of header length.
    fn header_len_num_bytes(self) -> usize {
        match self {
            Version::V1_0 => 2,
            Version::V2_0 | Version::V3_0 => 4,
        }
    }

    fn prefix_len(self) -> usize {
        MAGIC_STRING.len() + Self::VERSION_NUM_BYTES + self.header_len_num_bytes()
    }

    fn read_header_len<R: io::Read>(self, mut reader: R) -> io::Result<usize> {
        let mut buf = [0; 4];
        reader.read_exact(&mut buf[..self.header_len_num_bytes()])?;
        Ok(match self {
            Version::V1_0 => LittleEndian::read_u16(&buf) as usize,
            Version::V2_0 | Version::V3_0 => LittleEndian::read_u32(&buf) as usize,
        })
    }

    fn write_header_len(self, header_len: usize, out: &mut Vec<u8>) {
        let mut buf = [0; 4];
        match self {
            Version::V1_0 => LittleEndian::write_u16(&mut buf, header_len as u16),
            Version::V2_0 | Version::V3_0 => LittleEndian::write_u32(&mut buf, header_len as u32),
        }
        out.extend_from_slice(&buf[..self.header_len_num_bytes()]);
    }
}

/// The dictionary at the start of every `.npy` member.
#[derive(Clone, Debug, PartialEq)]
pub struct Header {
    pub type_descriptor: PyValue,
    pub fortran_order: bool,
    pub shape: Vec<usize>,
}

impl Header {
    /// Header for a C-ordered array.
    pub fn new(type_descriptor: PyValue, shape: Vec<usize>) -> Header {
        Header {
            type_descriptor,
            fortran_order: false,
            shape,
        }
    }

    /// Number of elements described by the shape, or `None` on overflow.
    pub fn len(&self) -> Option<usize> {
        self.shape
            .iter()
            .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
    }

    fn from_py_value(value: PyValue) -> Result<Self, ParseHeaderError> {
        let dict = match value {
            PyValue::Dict(dict) => dict,
            other => return Err(ParseHeaderError::MetaNotDict(other)),
        };
        let mut type_descriptor: Option<PyValue> = None;
        let mut fortran_order: Option<bool> = None;
        let mut shape: Option<Vec<usize>> = None;
        for (key, value) in dict {
            match key {
                PyValue::String(ref k) if k == "descr" => type_descriptor = Some(value),
                PyValue::String(ref k) if k == "fortran_order" => match value {
                    PyValue::Boolean(b) => fortran_order = Some(b),
                    value => {
                        return Err(ParseHeaderError::IllegalValue {
                            key: "fortran_order",
                            value,
                        })
                    }
                },
                PyValue::String(ref k) if k == "shape" => match parse_shape(&value) {
                    Some(s) => shape = Some(s),
                    None => return Err(ParseHeaderError::IllegalValue { key: "shape", value }),
                },
                k => return Err(ParseHeaderError::UnknownKey(k)),
            }
        }
        Ok(Header {
            type_descriptor: type_descriptor.ok_or(ParseHeaderError::MissingKey("descr"))?,
            fortran_order: fortran_order.ok_or(ParseHeaderError::MissingKey("fortran_order"))?,
            shape: shape.ok_or(ParseHeaderError::MissingKey("shape"))?,
        })
    }

    pub fn from_reader<R: io::Read>(mut reader: R) -> Result<Self, ReadHeaderError> {
        let mut magic = [0; MAGIC_STRING.len()];
        reader.read_exact(&mut magic)?;
        if magic != MAGIC_STRING {
            return Err(ParseHeaderError::MagicString.into());
        }

        let mut version = [0; Version::VERSION_NUM_BYTES];
        reader.read_exact(&mut version)?;
        let version = Version::from_bytes(version)?;

        let header_len = version.read_header_len(&mut reader)?;
        let mut buf = vec![0; header_len];
        reader.read_exact(&mut buf)?;
        let without_newline = match buf.split_last() {
            Some((&b'\n', rest)) => rest,
            Some(_) | None => return Err(ParseHeaderError::MissingNewline.into()),
        };
        let header_str = match version {
            Version::V1_0 | Version::V2_0 if !without_newline.is_ascii() => {
                return Err(ParseHeaderError::NonAscii.into())
            }
            _ => std::str::from_utf8(without_newline).map_err(ParseHeaderError::from)?,
        };
        let dict: PyValue = header_str.parse().map_err(ParseHeaderError::from)?;
        Ok(Header::from_py_value(dict)?)
    }

    fn to_py_value(&self) -> PyValue {
        PyValue::Dict(vec![
            (PyValue::String("descr".into()), self.type_descriptor.clone()),
            (
                PyValue::String("fortran_order".into()),
                PyValue::Boolean(self.fortran_order),
            ),
            (
                PyValue::String("shape".into()),
                PyValue::Tuple(
                    self.shape
                        .iter()
                        .map(|&elem| PyValue::Integer(elem.into()))
                        .collect(),
                ),
            ),
        ])
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, PyValueFormatError> {
        let mut dict = Vec::new();
        self.to_py_value().write_ascii(&mut dict)?;

        // Pick the smallest version whose length field fits the padded
        // dictionary plus its newline.
        let padded = |version: Version| {
            let unpadded = version.prefix_len() + dict.len() + 1;
            unpadded + (HEADER_ALIGN - unpadded % HEADER_ALIGN) % HEADER_ALIGN
        };
        let version = if padded(Version::V1_0) - Version::V1_0.prefix_len() <= u16::MAX as usize {
            Version::V1_0
        } else {
            Version::V2_0
        };
        let total_len = padded(version);
        let header_len = total_len - version.prefix_len();

        let mut out = Vec::with_capacity(total_len);
        out.extend_from_slice(MAGIC_STRING);
        out.extend_from_slice(&version.to_bytes());
        version.write_header_len(header_len, &mut out);
        out.extend_from_slice(&dict);
        out.resize(total_len - 1, b' ');
        out.push(b'\n');
        debug_assert_eq!(out.len() % HEADER_ALIGN, 0);
        Ok(out)
    }

    pub fn write<W: io::Write>(&self, mut writer: W) -> Result<(), WriteHeaderError> {
        writer.write_all(&self.to_bytes()?)?;
        Ok(())
    }
}

fn parse_shape(value: &PyValue) -> Option<Vec<usize>> {
    value
        .as_tuple()?
        .iter()
        .map(|elem| elem.as_integer()?.to_usize())
        .collect()
}
