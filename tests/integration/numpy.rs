//! Containers assembled member by member, the way `numpy.savez` lays them out.

use ndarray::array;
use num_complex::Complex;
use riesling_io::{Error, MetaValue, ReadNpyError, SchemaError};
use std::error::Error as StdError;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const INFO_DESCR: &str = "[('matrix', '<i8', (3,)), ('voxel_size', '<f4', (3,)), \
    ('origin', '<f4', (3,)), ('direction', '<f4', (3, 3)), ('tr', '<f4')]";

/// A version 1.0 `.npy` member with `dict` padded the way numpy pads it.
fn npy(dict: &str, payload: &[u8]) -> Vec<u8> {
    let mut header = dict.to_owned();
    let unpadded = 10 + header.len() + 1;
    header.push_str(&" ".repeat((64 - unpadded % 64) % 64));
    header.push('\n');
    let mut bytes = b"\x93NUMPY\x01\x00".to_vec();
    bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
    bytes.extend_from_slice(header.as_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

fn archive(members: &[(&str, Vec<u8>)]) -> Result<Vec<u8>, Box<dyn StdError>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, bytes) in members {
        zip.start_file(*name, options)?;
        zip.write_all(bytes)?;
    }
    Ok(zip.finish()?.into_inner())
}

/// `>c8` in Fortran order, as a big-endian host with a transposed array
/// would write it.
fn big_endian_data() -> Vec<u8> {
    let mut payload = Vec::new();
    for (re, im) in [(1f32, 0f32), (3., 0.), (2., 0.), (4., -1.)] {
        payload.extend_from_slice(&re.to_be_bytes());
        payload.extend_from_slice(&im.to_be_bytes());
    }
    npy(
        "{'descr': '>c8', 'fortran_order': True, 'shape': (2, 2), }",
        &payload,
    )
}

fn info_record(tr: f32) -> Vec<u8> {
    let mut record = Vec::new();
    for m in [8i64, 8, 1] {
        record.extend_from_slice(&m.to_le_bytes());
    }
    for v in [1f32, 1., 3., 0., 0., 0., 1., 0., 0., 0., 1., 0., 0., 0., 1., tr] {
        record.extend_from_slice(&v.to_le_bytes());
    }
    record
}

#[test]
fn foreign_container() -> Result<(), Box<dyn StdError>> {
    let info = npy(
        &format!(
            "{{'descr': {}, 'fortran_order': False, 'shape': (1,), }}",
            INFO_DESCR
        ),
        &info_record(5.),
    );
    let te = npy(
        "{'descr': '<f8', 'fortran_order': False, 'shape': (), }",
        &0.002f64.to_le_bytes(),
    );
    let echoes = npy(
        "{'descr': '<i4', 'fortran_order': False, 'shape': (2,), }",
        &[2, 0, 0, 0, 9, 0, 0, 0],
    );
    let buf = archive(&[
        ("data.npy", big_endian_data()),
        ("info.npy", info),
        ("meta/te.npy", te),
        ("meta/echoes.npy", echoes),
    ])?;

    let read = riesling_io::read_from(Cursor::new(buf), "data")?;
    assert_eq!(
        read.data.array(),
        &array![
            [Complex::new(1f32, 0.), Complex::new(2., 0.)],
            [Complex::new(3., 0.), Complex::new(4., -1.)]
        ]
        .into_dyn()
    );
    assert_eq!(read.data.labels(), ["dim_0", "dim_1"]);
    let info = read.info.unwrap();
    assert_eq!(info.matrix, [8, 8, 1]);
    assert_eq!(info.voxel_size, [1., 1., 3.]);
    assert_eq!(info.tr, 5.);
    let meta = read.meta.unwrap();
    assert_eq!(meta.get("te"), Some(&MetaValue::Float(0.002)));
    assert_eq!(meta.get("echoes"), Some(&MetaValue::Int(2)));
    Ok(())
}

#[test]
fn info_with_two_records() -> Result<(), Box<dyn StdError>> {
    let mut records = info_record(1.);
    records.extend(info_record(2.));
    let info = npy(
        &format!(
            "{{'descr': {}, 'fortran_order': False, 'shape': (2,), }}",
            INFO_DESCR
        ),
        &records,
    );
    let buf = archive(&[("data.npy", big_endian_data()), ("info.npy", info)])?;
    match riesling_io::read_from(Cursor::new(buf), "data") {
        Err(Error::Schema(SchemaError::InfoCount(2))) => {}
        other => panic!("unexpected result: {:?}", other),
    }
    Ok(())
}

#[test]
fn info_with_reordered_fields() -> Result<(), Box<dyn StdError>> {
    let descr = "[('tr', '<f4'), ('matrix', '<i8', (3,)), ('voxel_size', '<f4', (3,)), \
        ('origin', '<f4', (3,)), ('direction', '<f4', (3, 3))]";
    let info = npy(
        &format!(
            "{{'descr': {}, 'fortran_order': False, 'shape': (1,), }}",
            descr
        ),
        &info_record(1.),
    );
    let buf = archive(&[("data.npy", big_endian_data()), ("info.npy", info)])?;
    match riesling_io::read_from(Cursor::new(buf), "data") {
        Err(Error::Schema(SchemaError::InfoDescriptor(_))) => {}
        other => panic!("unexpected result: {:?}", other),
    }
    Ok(())
}

#[test]
fn empty_meta_entry() -> Result<(), Box<dyn StdError>> {
    let empty = npy("{'descr': '<f8', 'fortran_order': False, 'shape': (0,), }", &[]);
    let buf = archive(&[("data.npy", big_endian_data()), ("meta/none.npy", empty)])?;
    match riesling_io::read_from(Cursor::new(buf), "data") {
        Err(Error::Schema(SchemaError::EmptyMeta(key))) => assert_eq!(key, "none"),
        other => panic!("unexpected result: {:?}", other),
    }
    Ok(())
}

#[test]
fn oversized_shapes_are_errors() -> Result<(), Box<dyn StdError>> {
    let huge_meta = npy(
        "{'descr': '<f8', 'fortran_order': False, 'shape': (4611686018427387904,), }",
        &[0; 8],
    );
    let buf = archive(&[("data.npy", big_endian_data()), ("meta/x.npy", huge_meta)])?;
    match riesling_io::read_from(Cursor::new(buf), "data") {
        Err(Error::ReadNpy(ReadNpyError::ReadData(_))) => {}
        other => panic!("unexpected result: {:?}", other),
    }

    for shape in ["(8589934592, 8589934592)", "(1152921504606846976,)"] {
        let data = npy(
            &format!(
                "{{'descr': '<c8', 'fortran_order': False, 'shape': {}, }}",
                shape
            ),
            &[0; 8],
        );
        let buf = archive(&[("data.npy", data)])?;
        match riesling_io::read_from(Cursor::new(buf), "data") {
            Err(Error::ReadNpy(ReadNpyError::LengthOverflow)) => {}
            other => panic!("{} read as {:?}", shape, other),
        }
    }

    let huge_labels = npy(
        "{'descr': '<U4', 'fortran_order': False, 'shape': (2305843009213693952,), }",
        &[0; 16],
    );
    let buf = archive(&[("data.npy", big_endian_data()), ("axes/data.npy", huge_labels)])?;
    match riesling_io::read_from(Cursor::new(buf), "data") {
        Err(Error::ReadNpy(_)) => {}
        other => panic!("unexpected result: {:?}", other),
    }
    Ok(())
}
