//! This crate reads and writes MRI k-space acquisitions: a labeled complex
//! array, an optional sample trajectory, an optional [`Info`] record with the
//! scan geometry, and optional free-form [`Meta`]data.
//!
//! An acquisition is stored as a zip archive of [`.npy`] members, so the
//! files can also be opened with [`numpy.load`] as `.npz` archives:
//!
//! | member                | contents                                     |
//! |-----------------------|----------------------------------------------|
//! | `data.npy`            | primary array, `<c8`                         |
//! | `axes/data.npy`       | axis labels of the primary array, `<U{n}`    |
//! | `trajectory.npy`      | sample locations, `<f4`, `(co-ords, samples, traces)` |
//! | `info.npy`            | one structured record, see [`INFO_FIELDS`]   |
//! | `meta/<key>.npy`      | one element per metadata value               |
//! | `meta/`               | directory entry, present with any metadata   |
//!
//! See [`write`] and [`read`] for whole acquisitions, and [`Writer`] and
//! [`Reader`] for access to the individual parts.
//!
//! ```no_run
//! use ndarray::Array3;
//! use num_complex::Complex;
//! use riesling_io::{Acquisition, Info, LabeledArray, WriteOptions};
//!
//! let kspace = Array3::<Complex<f32>>::zeros((8, 64, 32));
//! let data = LabeledArray::new(kspace, ["channel", "sample", "trace"])?;
//! let info = Info::builder()
//!     .matrix([64, 64, 1])
//!     .voxel_size([1., 1., 1.])
//!     .origin([0., 0., 0.])
//!     .direction([[1., 0., 0.], [0., 1., 0.], [0., 0., 1.]])
//!     .tr(2.5)
//!     .build()?;
//! let acquisition = Acquisition::new(data).with_info(info);
//! riesling_io::write("scan.npz", &acquisition, &WriteOptions::default())?;
//!
//! let read = riesling_io::read("scan.npz")?;
//! assert_eq!(read, acquisition);
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! ```
//!
//! The `deflate` feature (on by default) enables [`Compression::Deflated`].
//!
//! [`.npy`]: https://numpy.org/doc/stable/reference/generated/numpy.lib.format.html
//! [`numpy.load`]: https://numpy.org/doc/stable/reference/generated/numpy.load.html
//!
//! # Limitations
//!
//! * Every member is written in full; there is no chunking or partial read.
//!
//! * The `descr` of the info record must match [`info_descriptor`] exactly.
//!   Records with extra, missing or reordered fields are rejected.
//!
//! * Metadata values are scalars. Array-shaped entries written by other tools
//!   are read back as their first element.

mod codec;
mod container;
mod error;
mod info;
mod labeled;
mod meta;
mod npy;
mod trajectory;

pub use crate::codec::{
    keys, read, read_dataset, read_from, write, write_to, Acquisition, Reader, WriteOptions,
    Writer,
};
pub use crate::container::Compression;
pub use crate::error::{Error, NotFound, Result, SchemaError, ValidationError};
pub use crate::info::{
    info_descriptor, Field, FieldType, FieldValue, Info, InfoBuilder, INFO_FIELDS,
    INFO_RECORD_SIZE,
};
pub use crate::labeled::LabeledArray;
pub use crate::meta::{Meta, MetaValue};
pub use crate::npy::header::ParseHeaderError;
pub use crate::npy::{
    ReadDataError, ReadNpyError, ReadNpyExt, ReadableElement, WritableElement, WriteNpyError,
    WriteNpyExt,
};
pub use crate::trajectory::{Trajectory, MAX_COORDS};
