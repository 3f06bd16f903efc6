//! Rejected inputs and missing sources.

use super::{info_4x4, kspace_4x4};
use ndarray::prelude::*;
use riesling_io::{
    Acquisition, Error, Meta, NotFound, SchemaError, Trajectory, ValidationError, WriteOptions,
};
use std::error::Error as StdError;

#[test]
fn malformed_trajectory() {
    assert_eq!(
        Trajectory::from_dyn(ArrayD::zeros(IxDyn(&[3, 64]))),
        Err(ValidationError::TrajectoryRank(2))
    );
    assert_eq!(
        Trajectory::new(Array3::zeros((4, 64, 16))),
        Err(ValidationError::TrajectoryCoords(4))
    );
}

#[test]
fn rejected_write_creates_nothing() -> Result<(), Box<dyn StdError>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("never.npz");

    let meta: Meta = vec![("bad/key", 1i64)].into_iter().collect();
    let acquisition = Acquisition::new(kspace_4x4()).with_meta(meta);
    match riesling_io::write(&path, &acquisition, &WriteOptions::new()) {
        Err(Error::Validation(ValidationError::EntryName(key))) => assert_eq!(key, "bad/key"),
        other => panic!("unexpected result: {:?}", other),
    }

    let acquisition = Acquisition::new(kspace_4x4());
    let options = WriteOptions::new().dataset("trajectory");
    match riesling_io::write(&path, &acquisition, &options) {
        Err(Error::Validation(ValidationError::ReservedName(name))) => {
            assert_eq!(name, "trajectory")
        }
        other => panic!("unexpected result: {:?}", other),
    }

    assert!(!path.exists());
    assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);
    Ok(())
}

#[test]
fn rejected_write_keeps_previous_file() -> Result<(), Box<dyn StdError>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("scan.npz");
    let original = Acquisition::new(kspace_4x4()).with_info(info_4x4());
    riesling_io::write(&path, &original, &WriteOptions::new())?;
    let before = std::fs::read(&path)?;

    let options = WriteOptions::new().dataset("a/b");
    assert!(riesling_io::write(&path, &original, &options).is_err());
    assert_eq!(std::fs::read(&path)?, before);
    assert_eq!(riesling_io::read(&path)?, original);
    Ok(())
}

#[test]
fn unwritable_destination() -> Result<(), Box<dyn StdError>> {
    let dir = tempfile::tempdir()?;
    let acquisition = Acquisition::new(kspace_4x4());

    let orphan = dir.path().join("missing").join("scan.npz");
    match riesling_io::write(&orphan, &acquisition, &WriteOptions::new()) {
        Err(Error::Io(_)) => {}
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(!dir.path().join("missing").exists());

    let occupied = dir.path().join("scan.npz");
    std::fs::create_dir(&occupied)?;
    match riesling_io::write(&occupied, &acquisition, &WriteOptions::new()) {
        Err(Error::Io(_)) => {}
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(occupied.is_dir());
    assert_eq!(std::fs::read_dir(&occupied)?.count(), 0);
    // Only the directory itself; no scratch file is left next to it.
    assert_eq!(std::fs::read_dir(dir.path())?.count(), 1);
    Ok(())
}

#[test]
fn missing_dataset() -> Result<(), Box<dyn StdError>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("scan.npz");
    riesling_io::write(&path, &Acquisition::new(kspace_4x4()), &WriteOptions::new())?;

    let err = riesling_io::read_dataset(&path, "nonexistent").unwrap_err();
    assert!(err.is_not_found());
    match err {
        Error::NotFound(NotFound::Dataset(name)) => assert_eq!(name, "nonexistent"),
        other => panic!("unexpected error: {}", other),
    }
    Ok(())
}

#[test]
fn missing_source() -> Result<(), Box<dyn StdError>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("missing.npz");
    match riesling_io::read(&path) {
        Err(Error::NotFound(NotFound::Source(missing))) => assert_eq!(missing, path),
        other => panic!("unexpected result: {:?}", other),
    }
    Ok(())
}

#[test]
fn source_is_not_a_container() -> Result<(), Box<dyn StdError>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "this is not a zip archive\n")?;
    let err = riesling_io::read(&path).unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(err, Error::NotFound(NotFound::InvalidContainer(_))));
    Ok(())
}

#[test]
fn partial_info() {
    let partial = riesling_io::Info::builder()
        .matrix([4, 4, 1])
        .voxel_size([1., 1., 1.])
        .origin([0., 0., 0.])
        .tr(2.5);
    assert_eq!(partial.build(), Err(SchemaError::MissingField("direction")));
}
