//! The scan geometry record.
//!
//! Stored as a one-element structured array. [`INFO_FIELDS`] is the only
//! description of its layout; the descriptor, field offsets and record size
//! used when writing and when reading are all derived from it.

use crate::error::SchemaError;
use byteorder::{ByteOrder, LittleEndian};
use py_literal::Value as PyValue;

/// Scalar type of an info field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    /// 8-byte signed integer, `<i8`.
    I64,
    /// 4-byte float, `<f4`.
    F32,
}

impl FieldType {
    pub const fn size(self) -> usize {
        match self {
            FieldType::I64 => 8,
            FieldType::F32 => 4,
        }
    }

    pub const fn descr(self) -> &'static str {
        match self {
            FieldType::I64 => "<i8",
            FieldType::F32 => "<f4",
        }
    }
}

/// One column of the info record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub ty: FieldType,
    /// Sub-array shape; empty for a scalar.
    pub shape: &'static [usize],
}

impl Field {
    /// Number of scalars in the field.
    pub const fn count(&self) -> usize {
        let mut count = 1;
        let mut i = 0;
        while i < self.shape.len() {
            count *= self.shape[i];
            i += 1;
        }
        count
    }

    /// Size of the field in bytes.
    pub const fn size(&self) -> usize {
        self.count() * self.ty.size()
    }

    fn descriptor(&self) -> PyValue {
        let name = PyValue::String(self.name.into());
        let descr = PyValue::String(self.ty.descr().into());
        if self.shape.is_empty() {
            PyValue::Tuple(vec![name, descr])
        } else {
            let shape = self
                .shape
                .iter()
                .map(|&n| PyValue::Integer(n.into()))
                .collect();
            PyValue::Tuple(vec![name, descr, PyValue::Tuple(shape)])
        }
    }
}

/// Fields of the info record, in on-disk order.
pub const INFO_FIELDS: [Field; 5] = [
    Field {
        name: "matrix",
        ty: FieldType::I64,
        shape: &[3],
    },
    Field {
        name: "voxel_size",
        ty: FieldType::F32,
        shape: &[3],
    },
    Field {
        name: "origin",
        ty: FieldType::F32,
        shape: &[3],
    },
    Field {
        name: "direction",
        ty: FieldType::F32,
        shape: &[3, 3],
    },
    Field {
        name: "tr",
        ty: FieldType::F32,
        shape: &[],
    },
];

/// Size of one packed record in bytes.
pub const INFO_RECORD_SIZE: usize = record_size(&INFO_FIELDS);

const fn record_size(fields: &[Field]) -> usize {
    let mut size = 0;
    let mut i = 0;
    while i < fields.len() {
        size += fields[i].size();
        i += 1;
    }
    size
}

/// The structured `descr` of the record, e.g. `[('matrix', '<i8', (3,)), …]`.
pub fn info_descriptor() -> PyValue {
    PyValue::List(INFO_FIELDS.iter().map(Field::descriptor).collect())
}

fn schema_field(name: &str) -> Option<&'static Field> {
    INFO_FIELDS.iter().find(|field| field.name == name)
}

/// The flattened values of one field.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Int(Vec<i64>),
    Float(Vec<f32>),
}

impl FieldValue {
    fn matches(&self, field: &Field) -> bool {
        match (self, field.ty) {
            (FieldValue::Int(values), FieldType::I64) => values.len() == field.count(),
            (FieldValue::Float(values), FieldType::F32) => values.len() == field.count(),
            _ => false,
        }
    }

    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            FieldValue::Int(values) => {
                for &v in values {
                    out.extend_from_slice(&v.to_le_bytes());
                }
            }
            FieldValue::Float(values) => {
                for &v in values {
                    out.extend_from_slice(&v.to_le_bytes());
                }
            }
        }
    }

    fn decode(field: &Field, bytes: &[u8]) -> FieldValue {
        debug_assert_eq!(bytes.len(), field.size());
        let chunks = bytes.chunks_exact(field.ty.size());
        match field.ty {
            FieldType::I64 => FieldValue::Int(chunks.map(LittleEndian::read_i64).collect()),
            FieldType::F32 => FieldValue::Float(chunks.map(LittleEndian::read_f32).collect()),
        }
    }
}

/// Scanner geometry and timing.
#[derive(Clone, Debug, PartialEq)]
pub struct Info {
    /// Voxel grid dimensions.
    pub matrix: [i64; 3],
    /// Physical voxel size.
    pub voxel_size: [f32; 3],
    /// Spatial origin.
    pub origin: [f32; 3],
    /// Orientation matrix, row major.
    pub direction: [[f32; 3]; 3],
    /// Repetition time.
    pub tr: f32,
}

impl Info {
    /// Starts an info record whose fields are supplied one at a time.
    pub fn builder() -> InfoBuilder {
        InfoBuilder::default()
    }

    /// The value of the field called `name`.
    pub fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "matrix" => FieldValue::Int(self.matrix.to_vec()),
            "voxel_size" => FieldValue::Float(self.voxel_size.to_vec()),
            "origin" => FieldValue::Float(self.origin.to_vec()),
            "direction" => FieldValue::Float(self.direction.iter().flatten().copied().collect()),
            "tr" => FieldValue::Float(vec![self.tr]),
            _ => return None,
        })
    }

    /// All fields with their values, in on-disk order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, FieldValue)> + '_ {
        INFO_FIELDS
            .iter()
            .filter_map(move |field| Some((field.name, self.field(field.name)?)))
    }

    /// Packs the record in schema order.
    pub fn to_record(&self) -> Vec<u8> {
        let mut record = Vec::with_capacity(INFO_RECORD_SIZE);
        for (_, value) in self.fields() {
            value.encode(&mut record);
        }
        debug_assert_eq!(record.len(), INFO_RECORD_SIZE);
        record
    }

    /// Unpacks a record produced by [`Info::to_record`] or by numpy with the
    /// same descriptor.
    pub fn from_record(record: &[u8]) -> Result<Info, SchemaError> {
        if record.len() != INFO_RECORD_SIZE {
            return Err(SchemaError::InfoSize {
                expected: INFO_RECORD_SIZE,
                actual: record.len(),
            });
        }
        let mut builder = InfoBuilder::default();
        let mut offset = 0;
        for field in &INFO_FIELDS {
            let bytes = &record[offset..offset + field.size()];
            builder = builder.set(field.name, FieldValue::decode(field, bytes))?;
            offset += field.size();
        }
        builder.build()
    }
}

/// Collects info fields in any order. [`InfoBuilder::build`] fails if any
/// field was never set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InfoBuilder {
    matrix: Option<[i64; 3]>,
    voxel_size: Option<[f32; 3]>,
    origin: Option<[f32; 3]>,
    direction: Option<[[f32; 3]; 3]>,
    tr: Option<f32>,
}

impl InfoBuilder {
    pub fn matrix(mut self, matrix: [i64; 3]) -> Self {
        self.matrix = Some(matrix);
        self
    }

    pub fn voxel_size(mut self, voxel_size: [f32; 3]) -> Self {
        self.voxel_size = Some(voxel_size);
        self
    }

    pub fn origin(mut self, origin: [f32; 3]) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn direction(mut self, direction: [[f32; 3]; 3]) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn tr(mut self, tr: f32) -> Self {
        self.tr = Some(tr);
        self
    }

    /// Sets a field by name from flattened values.
    pub fn set(self, name: &str, value: FieldValue) -> Result<Self, SchemaError> {
        let field =
            schema_field(name).ok_or_else(|| SchemaError::UnknownField(name.to_owned()))?;
        if !value.matches(field) {
            return Err(SchemaError::FieldShape {
                field: field.name,
                value,
            });
        }
        Ok(match (field.name, value) {
            ("matrix", FieldValue::Int(v)) => self.matrix([v[0], v[1], v[2]]),
            ("voxel_size", FieldValue::Float(v)) => self.voxel_size([v[0], v[1], v[2]]),
            ("origin", FieldValue::Float(v)) => self.origin([v[0], v[1], v[2]]),
            ("direction", FieldValue::Float(v)) => self.direction([
                [v[0], v[1], v[2]],
                [v[3], v[4], v[5]],
                [v[6], v[7], v[8]],
            ]),
            ("tr", FieldValue::Float(v)) => self.tr(v[0]),
            (field, value) => return Err(SchemaError::FieldShape { field, value }),
        })
    }

    pub fn build(self) -> Result<Info, SchemaError> {
        Ok(Info {
            matrix: self.matrix.ok_or(SchemaError::MissingField("matrix"))?,
            voxel_size: self.voxel_size.ok_or(SchemaError::MissingField("voxel_size"))?,
            origin: self.origin.ok_or(SchemaError::MissingField("origin"))?,
            direction: self.direction.ok_or(SchemaError::MissingField("direction"))?,
            tr: self.tr.ok_or(SchemaError::MissingField("tr"))?,
        })
    }
}
