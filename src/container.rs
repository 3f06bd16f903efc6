//! The on-disk container: a zip archive of `.npy` members, readable by
//! `numpy.load` as an `.npz` file.

use crate::error::{Error, NotFound, Result, ValidationError};
use crate::npy::header::Header;
use crate::npy::{
    read_raw, read_unicode, unicode_descriptor, write_unicode, ReadNpyError, ReadNpyExt,
    ReadableElement, WritableElement, WriteNpyError, WriteNpyExt,
};
use ndarray::prelude::*;
use ndarray::{Data, DataOwned};
use std::collections::HashSet;
use std::io::{Read, Seek, Write};
use std::mem;
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Suffix of every member in the archive.
const NPY_SUFFIX: &str = ".npy";

/// Members at least this large need zip64 records.
const LARGE_FILE_THRESHOLD: usize = u32::MAX as usize;

/// Upper bound on the header of an array member written by `write_npy`: the
/// 10-byte version 1.0 prefix plus the largest length it can hold.
const MAX_ARRAY_HEADER_LEN: usize = 10 + u16::MAX as usize;

/// Whether a member of `member_len` bytes, header included, needs zip64.
fn needs_large_file(member_len: usize) -> bool {
    member_len >= LARGE_FILE_THRESHOLD
}

/// Per-member codec applied by the archive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
    /// No compression.
    Stored,
    /// Deflate, as used by `numpy.savez_compressed`.
    #[cfg(feature = "deflate")]
    Deflated,
}

impl Default for Compression {
    /// Deflate when available, otherwise no compression.
    fn default() -> Self {
        #[cfg(feature = "deflate")]
        {
            Compression::Deflated
        }
        #[cfg(not(feature = "deflate"))]
        {
            Compression::Stored
        }
    }
}

impl From<Compression> for CompressionMethod {
    fn from(compression: Compression) -> CompressionMethod {
        match compression {
            Compression::Stored => CompressionMethod::Stored,
            #[cfg(feature = "deflate")]
            Compression::Deflated => CompressionMethod::Deflated,
        }
    }
}

/// Checks one `/`-separated component of a member name.
pub(crate) fn check_entry_name(name: &str) -> std::result::Result<(), ValidationError> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.ends_with(NPY_SUFFIX)
    {
        Err(ValidationError::EntryName(name.to_owned()))
    } else {
        Ok(())
    }
}

fn member_name(name: &str) -> String {
    format!("{}{}", name, NPY_SUFFIX)
}

/// Writer for containers.
///
/// Each member is compressed independently and holds the whole array, so a
/// dataset is always a single chunk.
pub(crate) struct ContainerWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    options: FileOptions,
    /// Names already in the archive, as stored.
    written: HashSet<String>,
}

impl<W: Write + Seek> ContainerWriter<W> {
    pub fn new(writer: W, compression: Compression, level: Option<i32>) -> ContainerWriter<W> {
        ContainerWriter {
            zip: ZipWriter::new(writer),
            options: FileOptions::default()
                .compression_method(compression.into())
                .compression_level(level),
            written: HashSet::new(),
        }
    }

    /// Records `stored` as written, failing if it already is.
    fn claim(&mut self, name: &str, stored: String) -> Result<String> {
        if !self.written.insert(stored.clone()) {
            return Err(ValidationError::DuplicateEntry(name.to_owned()).into());
        }
        Ok(stored)
    }

    fn start(&mut self, name: &str, member_len: usize) -> Result<()> {
        let stored = self.claim(name, member_name(name))?;
        let options = self.options.large_file(needs_large_file(member_len));
        self.zip.start_file(stored, options)?;
        Ok(())
    }

    /// Adds an empty directory entry, so that a namespace without members
    /// still shows up on read.
    pub fn add_directory(&mut self, name: &str) -> Result<()> {
        let stored = self.claim(name, format!("{}/", name))?;
        self.zip.add_directory(stored, self.options)?;
        Ok(())
    }

    /// Adds an array with the specified `name`.
    pub fn add_array<S, D>(&mut self, name: &str, array: &ArrayBase<S, D>) -> Result<()>
    where
        S::Elem: WritableElement,
        S: Data,
        D: Dimension,
    {
        let payload_len = array.len().saturating_mul(mem::size_of::<S::Elem>());
        self.start(name, payload_len.saturating_add(MAX_ARRAY_HEADER_LEN))?;
        array.write_npy(&mut self.zip)?;
        Ok(())
    }

    /// Adds a one-dimensional array of strings.
    pub fn add_strings<T: AsRef<str>>(&mut self, name: &str, strings: &[T]) -> Result<()> {
        let header = Header::new(unicode_descriptor(strings), vec![strings.len()]);
        let mut payload = Vec::new();
        write_unicode(strings, &mut payload)?;
        self.add_raw(name, &header, &payload)
    }

    /// Adds a member whose payload is already encoded for `header`.
    pub fn add_raw(&mut self, name: &str, header: &Header, payload: &[u8]) -> Result<()> {
        let header = header.to_bytes().map_err(WriteNpyError::from)?;
        self.start(name, header.len() + payload.len())?;
        self.zip.write_all(&header)?;
        self.zip.write_all(payload)?;
        Ok(())
    }

    /// Finishes the zip directory and flushes the writer, returning it.
    ///
    /// Dropping the writer also finishes the archive, but any error there
    /// is lost.
    pub fn finish(mut self) -> Result<W> {
        let mut writer = self.zip.finish()?;
        writer.flush()?;
        Ok(writer)
    }
}

/// Reader for containers.
pub(crate) struct ContainerReader<R: Read + Seek> {
    zip: ZipArchive<R>,
}

impl<R: Read + Seek> ContainerReader<R> {
    pub fn new(reader: R) -> Result<ContainerReader<R>> {
        match ZipArchive::new(reader) {
            Ok(zip) => Ok(ContainerReader { zip }),
            Err(ZipError::Io(err)) => Err(Error::Io(err)),
            Err(err) => Err(NotFound::InvalidContainer(err).into()),
        }
    }

    /// Names of all members, without the `.npy` suffix, in archive order.
    /// Directory entries are skipped.
    pub fn names(&mut self) -> Result<Vec<String>> {
        let mut names = Vec::with_capacity(self.zip.len());
        for i in 0..self.zip.len() {
            let file = self.zip.by_index_raw(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name();
            names.push(name.strip_suffix(NPY_SUFFIX).unwrap_or(name).to_owned());
        }
        Ok(names)
    }

    /// Whether the archive has a directory entry called `name`.
    pub fn has_directory(&self, name: &str) -> bool {
        self.zip
            .file_names()
            .any(|n| n.strip_suffix('/') == Some(name))
    }

    /// Resolves `name` (with or without the suffix) to a member name.
    fn resolve(&self, name: &str) -> Option<String> {
        let mut names = self.zip.file_names();
        if names.any(|n| n == name) {
            return Some(name.to_owned());
        }
        let suffixed = member_name(name);
        if self.zip.file_names().any(|n| n == suffixed) {
            Some(suffixed)
        } else {
            None
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    fn member(&mut self, name: &str) -> Result<zip::read::ZipFile<'_>> {
        let resolved = self
            .resolve(name)
            .ok_or_else(|| NotFound::Dataset(name.to_owned()))?;
        Ok(self.zip.by_name(&resolved)?)
    }

    /// Reads an array by name.
    pub fn by_name<S, D>(&mut self, name: &str) -> Result<ArrayBase<S, D>>
    where
        S::Elem: ReadableElement,
        S: DataOwned,
        D: Dimension,
    {
        Ok(ArrayBase::<S, D>::read_npy(self.member(name)?)?)
    }

    /// Reads a one-dimensional string array by name.
    pub fn strings(&mut self, name: &str) -> Result<Vec<String>> {
        let (header, payload) = self.raw(name)?;
        let len = header.len().ok_or(ReadNpyError::LengthOverflow)?;
        Ok(read_unicode(&payload[..], &header.type_descriptor, len).map_err(ReadNpyError::from)?)
    }

    /// Reads the header and undecoded payload of a member.
    pub fn raw(&mut self, name: &str) -> Result<(Header, Vec<u8>)> {
        Ok(read_raw(self.member(name)?)?)
    }
}
