use ndarray::prelude::*;
use num_complex::Complex;
use riesling_io::{Acquisition, Info, LabeledArray, Meta, Trajectory, WriteOptions};
use std::f32::consts::PI;

/// A single-channel 2D radial acquisition with `spokes` spokes.
fn radial(samples: usize, spokes: usize) -> Result<Acquisition, Box<dyn std::error::Error>> {
    let traj = Array3::from_shape_fn((2, samples, spokes), |(d, s, t)| {
        let r = s as f32 / samples as f32 - 0.5;
        let angle = PI * t as f32 / spokes as f32;
        if d == 0 {
            r * angle.cos()
        } else {
            r * angle.sin()
        }
    });
    let data = Array3::from_shape_fn((1, samples, spokes), |(_, s, _)| {
        Complex::new((-((s as f32 - samples as f32 / 2.).powi(2)) / 8.).exp(), 0.)
    });
    let info = Info::builder()
        .matrix([samples as i64, samples as i64, 1])
        .voxel_size([1., 1., 1.])
        .origin([0., 0., 0.])
        .direction([[1., 0., 0.], [0., 1., 0.], [0., 0., 1.]])
        .tr(4.2)
        .build()?;
    let meta: Meta = vec![("sequence", "radial"), ("readout", "bipolar")]
        .into_iter()
        .collect();
    Ok(
        Acquisition::new(LabeledArray::new(data, ["channel", "sample", "trace"])?)
            .with_trajectory(Trajectory::new(traj)?)
            .with_info(info)
            .with_meta(meta),
    )
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = "radial.npz";
    riesling_io::write(path, &radial(64, 32)?, &WriteOptions::default())?;

    let read = riesling_io::read(path)?;
    println!("labels = {:?}", read.data.labels());
    println!("shape = {:?}", read.data.array().shape());
    if let Some(trajectory) = &read.trajectory {
        println!(
            "trajectory: {} co-ords, {} samples, {} traces",
            trajectory.n_coords(),
            trajectory.n_samples(),
            trajectory.n_traces()
        );
    }
    if let Some(info) = &read.info {
        println!("matrix = {:?}, tr = {}", info.matrix, info.tr);
    }
    for (key, value) in read.meta.iter().flatten() {
        println!("meta/{} = {:?}", key, value);
    }
    Ok(())
}
