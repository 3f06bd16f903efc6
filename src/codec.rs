//! Writing and reading whole acquisitions.

use crate::container::{check_entry_name, Compression, ContainerReader, ContainerWriter};
use crate::error::{Error, NotFound, Result, SchemaError, ValidationError};
use crate::info::{info_descriptor, Info};
use crate::labeled::LabeledArray;
use crate::meta::{Meta, MetaValue};
use crate::npy::header::Header;
use crate::npy::{ReadNpyError, ReadableElement, WritableElement};
use crate::trajectory::Trajectory;
use ndarray::prelude::*;
use ndarray::Data;
use num_complex::Complex;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Names of the well-known members, without the `.npy` suffix.
pub mod keys {
    /// Default name of the primary dataset.
    pub const DATA: &str = "data";
    pub const INFO: &str = "info";
    pub const TRAJECTORY: &str = "trajectory";
    /// Namespace of the metadata entries.
    pub const META: &str = "meta";
    /// Namespace of the axis labels, one entry per dataset.
    pub const AXES: &str = "axes";
}

/// Member names that cannot be used for a dataset.
const RESERVED: [&str; 2] = [keys::INFO, keys::TRAJECTORY];

fn axes_entry(dataset: &str) -> String {
    format!("{}/{}", keys::AXES, dataset)
}

fn meta_entry(key: &str) -> String {
    format!("{}/{}", keys::META, key)
}

fn check_dataset_name(name: &str) -> std::result::Result<(), ValidationError> {
    check_entry_name(name)?;
    if RESERVED.contains(&name) {
        return Err(ValidationError::ReservedName(name.to_owned()));
    }
    Ok(())
}

/// Settings for a write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteOptions {
    compression: Compression,
    compression_level: Option<i32>,
    dataset: String,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            compression: Compression::default(),
            compression_level: None,
            dataset: keys::DATA.to_owned(),
        }
    }
}

impl WriteOptions {
    pub fn new() -> WriteOptions {
        WriteOptions::default()
    }

    /// Sets the codec applied to every member.
    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Sets the codec's level. `None` uses the codec's default.
    pub fn compression_level(mut self, level: Option<i32>) -> Self {
        self.compression_level = level;
        self
    }

    /// Sets the name the primary array is stored under.
    pub fn dataset<S: Into<String>>(mut self, dataset: S) -> Self {
        self.dataset = dataset.into();
        self
    }

    pub fn get_compression(&self) -> Compression {
        self.compression
    }

    pub fn get_dataset(&self) -> &str {
        &self.dataset
    }
}

/// Everything stored in one container.
#[derive(Clone, Debug, PartialEq)]
pub struct Acquisition {
    /// The primary k-space array.
    pub data: LabeledArray,
    pub info: Option<Info>,
    pub trajectory: Option<Trajectory>,
    pub meta: Option<Meta>,
}

impl Acquisition {
    pub fn new(data: LabeledArray) -> Acquisition {
        Acquisition {
            data,
            info: None,
            trajectory: None,
            meta: None,
        }
    }

    pub fn with_info(mut self, info: Info) -> Self {
        self.info = Some(info);
        self
    }

    pub fn with_trajectory(mut self, trajectory: Trajectory) -> Self {
        self.trajectory = Some(trajectory);
        self
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Checks every name that will become a member.
    fn validate(&self, options: &WriteOptions) -> std::result::Result<(), ValidationError> {
        check_dataset_name(&options.dataset)?;
        if let Some(meta) = &self.meta {
            for key in meta.keys() {
                check_entry_name(key)?;
            }
        }
        Ok(())
    }
}

/// Adds the parts of an acquisition to a container one at a time.
///
/// Nothing is readable until [`Writer::finish`] has returned.
pub struct Writer<W: Write + Seek> {
    container: ContainerWriter<W>,
}

impl<W: Write + Seek> Writer<W> {
    pub fn new(sink: W, options: &WriteOptions) -> Writer<W> {
        Writer {
            container: ContainerWriter::new(sink, options.compression, options.compression_level),
        }
    }

    /// Adds a complex dataset and its axis labels.
    pub fn add_labeled(&mut self, name: &str, data: &LabeledArray) -> Result<()> {
        check_dataset_name(name)?;
        self.container.add_array(name, data.array())?;
        self.container.add_strings(&axes_entry(name), data.labels())
    }

    /// Adds an arbitrary array under `name`.
    pub fn add_array<S, D>(&mut self, name: &str, array: &ArrayBase<S, D>) -> Result<()>
    where
        S::Elem: WritableElement,
        S: Data,
        D: Dimension,
    {
        check_dataset_name(name)?;
        self.container.add_array(name, array)
    }

    pub fn add_trajectory(&mut self, trajectory: &Trajectory) -> Result<()> {
        self.container.add_array(keys::TRAJECTORY, trajectory.points())
    }

    pub fn add_info(&mut self, info: &Info) -> Result<()> {
        let header = Header::new(info_descriptor(), vec![1]);
        self.container.add_raw(keys::INFO, &header, &info.to_record())
    }

    /// Adds one metadata entry. `key` must be non-empty and free of `/`.
    pub fn add_meta(&mut self, key: &str, value: &MetaValue) -> Result<()> {
        check_entry_name(key)?;
        let (header, payload) = value.encode()?;
        self.container.add_raw(&meta_entry(key), &header, &payload)
    }

    /// Adds the metadata namespace and every entry of `meta`. The namespace
    /// is written even when `meta` is empty, so an empty set reads back as
    /// `Some`.
    pub fn add_metadata(&mut self, meta: &Meta) -> Result<()> {
        for key in meta.keys() {
            check_entry_name(key)?;
        }
        self.container.add_directory(keys::META)?;
        for (key, value) in meta {
            self.add_meta(key, value)?;
        }
        Ok(())
    }

    /// Completes the container and returns the sink.
    pub fn finish(self) -> Result<W> {
        self.container.finish()
    }
}

fn write_parts<W: Write + Seek>(
    sink: W,
    acquisition: &Acquisition,
    options: &WriteOptions,
) -> Result<W> {
    let mut writer = Writer::new(sink, options);
    writer.add_labeled(&options.dataset, &acquisition.data)?;
    if let Some(trajectory) = &acquisition.trajectory {
        writer.add_trajectory(trajectory)?;
    }
    if let Some(info) = &acquisition.info {
        writer.add_info(info)?;
    }
    if let Some(meta) = &acquisition.meta {
        writer.add_metadata(meta)?;
    }
    writer.finish()
}

/// Writes `acquisition` to the file at `path`, replacing any existing file.
///
/// The container is assembled in a temporary file next to `path` and moved
/// into place once complete, so a failed write leaves `path` as it was. A
/// replaced file keeps its permissions; a new one gets the usual mode for
/// newly created files.
pub fn write<P: AsRef<Path>>(
    path: P,
    acquisition: &Acquisition,
    options: &WriteOptions,
) -> Result<()> {
    let path = path.as_ref();
    acquisition.validate(options)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = temp_file_in(dir)?;
    {
        let sink = write_parts(BufWriter::new(tmp.as_file_mut()), acquisition, options)?;
        sink.into_inner().map_err(io::IntoInnerError::into_error)?;
    }
    if let Ok(existing) = fs::metadata(path) {
        tmp.as_file().set_permissions(existing.permissions())?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

/// Creates the scratch file for [`write`]. On unix it is opened with mode
/// `0o666`, which the umask narrows like any other new file.
fn temp_file_in(dir: &Path) -> io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".riesling");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}

/// Writes `acquisition` to `sink` and returns it.
pub fn write_to<W: Write + Seek>(
    sink: W,
    acquisition: &Acquisition,
    options: &WriteOptions,
) -> Result<W> {
    acquisition.validate(options)?;
    write_parts(sink, acquisition, options)
}

/// Reads the acquisition stored under the default dataset name.
pub fn read<P: AsRef<Path>>(path: P) -> Result<Acquisition> {
    read_dataset(path, keys::DATA)
}

/// Reads the acquisition whose primary array is `dataset`.
pub fn read_dataset<P: AsRef<Path>>(path: P, dataset: &str) -> Result<Acquisition> {
    Reader::open(path)?.acquisition(dataset)
}

/// Reads the acquisition whose primary array is `dataset` from `source`.
pub fn read_from<R: Read + Seek>(source: R, dataset: &str) -> Result<Acquisition> {
    Reader::new(source)?.acquisition(dataset)
}

/// Random access to the parts of a container.
pub struct Reader<R: Read + Seek> {
    container: ContainerReader<R>,
}

impl Reader<BufReader<File>> {
    /// Opens the container at `path` read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => Error::from(NotFound::Source(path.to_owned())),
            _ => Error::Io(err),
        })?;
        Reader::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> Reader<R> {
    pub fn new(source: R) -> Result<Self> {
        Ok(Reader {
            container: ContainerReader::new(source)?,
        })
    }

    /// Every member, without the `.npy` suffix, in archive order.
    pub fn names(&mut self) -> Result<Vec<String>> {
        self.container.names()
    }

    /// Whether a member called `name` exists. The `.npy` suffix is optional.
    pub fn contains(&self, name: &str) -> bool {
        self.container.contains(name)
    }

    /// Top-level arrays other than the info record and the trajectory.
    pub fn dataset_names(&mut self) -> Result<Vec<String>> {
        Ok(self
            .names()?
            .into_iter()
            .filter(|name| !name.contains('/') && !RESERVED.contains(&name.as_str()))
            .collect())
    }

    /// Keys of the metadata entries, in archive order.
    pub fn meta_keys(&mut self) -> Result<Vec<String>> {
        let prefix = meta_entry("");
        Ok(self
            .names()?
            .into_iter()
            .filter_map(|name| name.strip_prefix(&prefix).map(str::to_owned))
            .collect())
    }

    /// Reads any member as an array of `A`.
    pub fn read_array<A, D>(&mut self, name: &str) -> Result<Array<A, D>>
    where
        A: ReadableElement,
        D: Dimension,
    {
        self.container.by_name(name)
    }

    /// Axis labels stored for `dataset`, if any.
    pub fn labels(&mut self, dataset: &str) -> Result<Option<Vec<String>>> {
        let entry = axes_entry(dataset);
        if !self.contains(&entry) {
            return Ok(None);
        }
        self.container.strings(&entry).map(Some)
    }

    /// Reads a complex dataset with its labels, naming the axes `dim_0`,
    /// `dim_1`, … when no labels were stored.
    pub fn read_labeled(&mut self, dataset: &str) -> Result<LabeledArray> {
        let array = self.read_array::<Complex<f32>, IxDyn>(dataset)?;
        match self.labels(dataset)? {
            Some(labels) => Ok(LabeledArray::new(array, labels)?),
            None => Ok(LabeledArray::with_default_labels(array)),
        }
    }

    /// The info record, if present.
    pub fn info(&mut self) -> Result<Option<Info>> {
        if !self.contains(keys::INFO) {
            return Ok(None);
        }
        let (header, record) = self.container.raw(keys::INFO)?;
        if header.type_descriptor != info_descriptor() {
            return Err(SchemaError::InfoDescriptor(header.type_descriptor).into());
        }
        match header.len() {
            Some(1) => {}
            Some(count) => return Err(SchemaError::InfoCount(count).into()),
            None => return Err(ReadNpyError::LengthOverflow.into()),
        }
        Ok(Some(Info::from_record(&record)?))
    }

    /// The trajectory, if present. Its layout is checked again on the way in.
    pub fn trajectory(&mut self) -> Result<Option<Trajectory>> {
        if !self.contains(keys::TRAJECTORY) {
            return Ok(None);
        }
        let points = self.read_array::<f32, IxDyn>(keys::TRAJECTORY)?;
        Ok(Some(Trajectory::from_dyn(points)?))
    }

    /// Every metadata entry. `None` when the container has neither entries
    /// nor an (empty) metadata directory.
    pub fn meta(&mut self) -> Result<Option<Meta>> {
        let names = self.meta_keys()?;
        if names.is_empty() && !self.container.has_directory(keys::META) {
            return Ok(None);
        }
        let mut meta = Meta::new();
        for key in names {
            let (header, payload) = self.container.raw(&meta_entry(&key))?;
            let value = MetaValue::decode(&key, &header, &payload)?;
            meta.insert(key, value);
        }
        Ok(Some(meta))
    }

    /// Reads `dataset` together with every optional part.
    pub fn acquisition(&mut self, dataset: &str) -> Result<Acquisition> {
        Ok(Acquisition {
            data: self.read_labeled(dataset)?,
            info: self.info()?,
            trajectory: self.trajectory()?,
            meta: self.meta()?,
        })
    }
}
