use crate::error::ValidationError;
use ndarray::prelude::*;

/// Largest number of co-ordinates per sample.
pub const MAX_COORDS: usize = 3;

/// k-space sample locations, laid out as `(co-ords, samples, traces)`.
///
/// Both constructors enforce the layout, so a `Trajectory` can always be
/// written as is.
#[derive(Clone, Debug, PartialEq)]
pub struct Trajectory {
    points: Array3<f32>,
}

impl Trajectory {
    /// Wraps `points`, checking that there are between 1 and
    /// [`MAX_COORDS`] co-ordinates.
    pub fn new(points: Array3<f32>) -> Result<Self, ValidationError> {
        let coords = points.len_of(Axis(0));
        if coords == 0 || coords > MAX_COORDS {
            return Err(ValidationError::TrajectoryCoords(coords));
        }
        Ok(Trajectory { points })
    }

    /// Like [`Trajectory::new`], for an array whose rank is only known at
    /// runtime.
    pub fn from_dyn(points: ArrayD<f32>) -> Result<Self, ValidationError> {
        let ndim = points.ndim();
        let points = points
            .into_dimensionality::<Ix3>()
            .map_err(|_| ValidationError::TrajectoryRank(ndim))?;
        Trajectory::new(points)
    }

    pub fn points(&self) -> &Array3<f32> {
        &self.points
    }

    pub fn n_coords(&self) -> usize {
        self.points.len_of(Axis(0))
    }

    pub fn n_samples(&self) -> usize {
        self.points.len_of(Axis(1))
    }

    pub fn n_traces(&self) -> usize {
        self.points.len_of(Axis(2))
    }

    pub fn into_inner(self) -> Array3<f32> {
        self.points
    }
}

impl TryFrom<ArrayD<f32>> for Trajectory {
    type Error = ValidationError;

    fn try_from(points: ArrayD<f32>) -> Result<Self, Self::Error> {
        Trajectory::from_dyn(points)
    }
}

impl TryFrom<Array3<f32>> for Trajectory {
    type Error = ValidationError;

    fn try_from(points: Array3<f32>) -> Result<Self, Self::Error> {
        Trajectory::new(points)
    }
}
