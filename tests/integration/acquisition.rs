//! Whole acquisitions written to disk and read back.

use super::{info_4x4, kspace_4x4, member_bytes};
use ndarray::array;
use ndarray::prelude::*;
use num_complex::Complex;
use riesling_io::{
    keys, Acquisition, Info, LabeledArray, Meta, MetaValue, Reader, Trajectory, WriteOptions,
    Writer,
};
use std::error::Error;
use std::io::Cursor;

#[test]
fn single_slice_with_info() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("slice.npz");
    let acquisition = Acquisition::new(kspace_4x4()).with_info(info_4x4());
    riesling_io::write(&path, &acquisition, &WriteOptions::default())?;

    let read = riesling_io::read(&path)?;
    assert_eq!(read.data, kspace_4x4());
    let info = read.info.unwrap();
    assert_eq!(info.matrix, [4, 4, 1]);
    assert_eq!(info.voxel_size, [1., 1., 1.]);
    assert_eq!(info.origin, [0., 0., 0.]);
    assert_eq!(info.direction, super::IDENTITY);
    assert_eq!(info.tr, 2.5);
    assert_eq!(read.trajectory, None);
    assert_eq!(read.meta, None);
    Ok(())
}

#[test]
fn data_only() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("data.npz");
    riesling_io::write(&path, &Acquisition::new(kspace_4x4()), &WriteOptions::new())?;

    let mut reader = Reader::open(&path)?;
    assert_eq!(reader.names()?, ["data", "axes/data"]);
    assert!(!reader.contains(keys::INFO));
    assert!(!reader.contains(keys::TRAJECTORY));
    assert!(reader.meta_keys()?.is_empty());

    let read = reader.acquisition(keys::DATA)?;
    assert_eq!(read, Acquisition::new(kspace_4x4()));
    Ok(())
}

#[test]
fn everything_round_trips() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("full.npz");

    let data = Array3::from_shape_fn((2, 16, 8), |(c, s, t)| {
        Complex::new(c as f32 + s as f32 * 0.5, t as f32 - 1.)
    });
    let data = LabeledArray::new(data, ["channel", "sample", "trace"])?;
    let points = Array3::from_shape_fn((3, 16, 8), |(d, s, t)| (d * 100 + s * 10 + t) as f32);
    let trajectory = Trajectory::new(points)?;
    let mut meta = Meta::new();
    meta.insert("flip", true);
    meta.insert("averages", 4i64);
    meta.insert("te", 0.004f64);
    meta.insert("bandwidth", 125.0f32);
    meta.insert("phase", Complex::new(0.5f32, -0.5));
    meta.insert("sequence", "zte");
    let info = Info {
        matrix: [64, 64, 32],
        voxel_size: [1., 1., 2.],
        origin: [-32., -32., -32.],
        direction: [[0., 1., 0.], [1., 0., 0.], [0., 0., -1.]],
        tr: 3.2,
    };
    let acquisition = Acquisition::new(data)
        .with_info(info)
        .with_trajectory(trajectory)
        .with_meta(meta);

    let options = WriteOptions::new().dataset("noncart");
    riesling_io::write(&path, &acquisition, &options)?;

    let read = riesling_io::read_dataset(&path, "noncart")?;
    assert_eq!(read, acquisition);
    let meta = read.meta.unwrap();
    assert_eq!(meta.get("te"), Some(&MetaValue::Float(0.004)));
    assert_eq!(meta.get("sequence"), Some(&MetaValue::Text("zte".into())));

    let mut reader = Reader::open(&path)?;
    assert_eq!(reader.dataset_names()?, ["noncart"]);
    assert_eq!(
        reader.meta_keys()?,
        ["averages", "bandwidth", "flip", "phase", "sequence", "te"]
    );
    let labels = reader.labels("noncart")?.unwrap();
    assert_eq!(labels, ["channel", "sample", "trace"]);
    Ok(())
}

#[test]
fn info_field_order_is_fixed() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("order.npz");
    let info = Info::builder()
        .tr(2.5)
        .direction(super::IDENTITY)
        .voxel_size([1., 1., 1.])
        .origin([0., 0., 0.])
        .matrix([4, 4, 1])
        .build()?;
    let acquisition = Acquisition::new(kspace_4x4()).with_info(info);
    riesling_io::write(&path, &acquisition, &WriteOptions::new())?;

    let bytes = member_bytes(&path, "info.npy");
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains(
        "[('matrix', '<i8', (3,)), ('voxel_size', '<f4', (3,)), \
         ('origin', '<f4', (3,)), ('direction', '<f4', (3, 3)), ('tr', '<f4')]"
    ));
    let record = &bytes[bytes.len() - riesling_io::INFO_RECORD_SIZE..];
    assert_eq!(&record[..8], &4i64.to_le_bytes());
    assert_eq!(&record[record.len() - 4..], &2.5f32.to_le_bytes());
    Ok(())
}

#[test]
fn overwrites_existing_file() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("scan.npz");
    std::fs::write(&path, b"previous contents")?;

    let acquisition = Acquisition::new(kspace_4x4()).with_info(info_4x4());
    riesling_io::write(&path, &acquisition, &WriteOptions::new())?;
    assert_eq!(riesling_io::read(&path)?, acquisition);

    let smaller = Acquisition::new(LabeledArray::with_default_labels(Array1::from(vec![
        Complex::new(1f32, 1.),
    ])));
    riesling_io::write(&path, &smaller, &WriteOptions::new())?;
    let read = riesling_io::read(&path)?;
    assert_eq!(read, smaller);
    assert_eq!(read.info, None);
    Ok(())
}

#[test]
fn empty_meta_round_trips() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("scan.npz");
    let acquisition = Acquisition::new(kspace_4x4()).with_meta(Meta::new());
    riesling_io::write(&path, &acquisition, &WriteOptions::new())?;

    let read = riesling_io::read(&path)?;
    assert_eq!(read.meta, Some(Meta::new()));
    assert_eq!(read, acquisition);
    let mut reader = Reader::open(&path)?;
    assert_eq!(reader.names()?, ["data", "axes/data"]);
    Ok(())
}

#[cfg(unix)]
#[test]
fn file_modes() -> Result<(), Box<dyn Error>> {
    use std::fs::{self, File, Permissions};
    use std::os::unix::fs::PermissionsExt;

    let mode = |path: &std::path::Path| -> std::io::Result<u32> {
        Ok(fs::metadata(path)?.permissions().mode() & 0o777)
    };
    let dir = tempfile::tempdir()?;
    let reference = dir.path().join("reference");
    File::create(&reference)?;

    // A new container gets the same mode as any other new file.
    let path = dir.path().join("scan.npz");
    let acquisition = Acquisition::new(kspace_4x4());
    riesling_io::write(&path, &acquisition, &WriteOptions::new())?;
    assert_eq!(mode(&path)?, mode(&reference)?);

    // A replaced container keeps its mode.
    for kept in [0o640, 0o664] {
        fs::set_permissions(&path, Permissions::from_mode(kept))?;
        riesling_io::write(&path, &acquisition, &WriteOptions::new())?;
        assert_eq!(mode(&path)?, kept);
    }
    assert_eq!(riesling_io::read(&path)?, acquisition);
    Ok(())
}

#[test]
fn several_datasets_in_one_container() -> Result<(), Box<dyn Error>> {
    let mut writer = Writer::new(Cursor::new(Vec::new()), &WriteOptions::new());
    writer.add_labeled("fully_sampled", &kspace_4x4())?;
    writer.add_labeled("undersampled", &kspace_4x4())?;
    writer.add_info(&info_4x4())?;
    writer.add_array("mask", &array![[true, false], [false, true]])?;
    let buf = writer.finish()?.into_inner();

    let mut reader = Reader::new(Cursor::new(buf))?;
    assert_eq!(
        reader.dataset_names()?,
        ["fully_sampled", "undersampled", "mask"]
    );
    let mask: Array2<bool> = reader.read_array("mask")?;
    assert_eq!(mask, array![[true, false], [false, true]]);
    let read = reader.acquisition("undersampled")?;
    assert_eq!(read.data, kspace_4x4());
    assert_eq!(read.info, Some(info_4x4()));
    Ok(())
}
