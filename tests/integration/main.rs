//! Integration tests.

use ndarray::prelude::*;
use num_complex::Complex;
use riesling_io::{Info, LabeledArray};
use std::fs::File;
use std::io::Read;
use std::path::Path;

mod acquisition;
mod errors;
mod numpy;

/// Identity orientation.
pub const IDENTITY: [[f32; 3]; 3] = [[1., 0., 0.], [0., 1., 0.], [0., 0., 1.]];

/// A 4×4 complex array with distinct values.
pub fn kspace_4x4() -> LabeledArray {
    let data = Array2::from_shape_fn((4, 4), |(i, j)| Complex::new(i as f32, -(j as f32)));
    LabeledArray::new(data, ["sample", "trace"]).unwrap()
}

/// Geometry of a single 4×4 slice with unit voxels.
pub fn info_4x4() -> Info {
    Info::builder()
        .matrix([4, 4, 1])
        .voxel_size([1., 1., 1.])
        .origin([0., 0., 0.])
        .direction(IDENTITY)
        .tr(2.5)
        .build()
        .unwrap()
}

/// Raw bytes of the member `name` in the archive at `path`.
pub fn member_bytes(path: &Path, name: &str) -> Vec<u8> {
    let mut zip = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut member = zip.by_name(name).unwrap();
    let mut bytes = Vec::new();
    member.read_to_end(&mut bytes).unwrap();
    bytes
}
