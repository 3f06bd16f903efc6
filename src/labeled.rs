use crate::error::ValidationError;
use ndarray::prelude::*;
use num_complex::Complex;

/// A complex single-precision array with one label per axis.
///
/// # Example
///
/// ```
/// use ndarray::Array3;
/// use num_complex::Complex;
/// use riesling_io::LabeledArray;
///
/// let kspace = Array3::<Complex<f32>>::zeros((8, 64, 32));
/// let data = LabeledArray::new(kspace, ["channel", "sample", "trace"])?;
/// assert_eq!(data.axis("trace").map(|axis| axis.index()), Some(2));
/// # Ok::<_, riesling_io::ValidationError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct LabeledArray {
    array: ArrayD<Complex<f32>>,
    labels: Vec<String>,
}

impl LabeledArray {
    /// Pairs `array` with `labels`, which must hold one entry per axis.
    pub fn new<D, I>(array: Array<Complex<f32>, D>, labels: I) -> Result<Self, ValidationError>
    where
        D: Dimension,
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.len() != array.ndim() {
            return Err(ValidationError::LabelCount {
                labels: labels.len(),
                ndim: array.ndim(),
            });
        }
        Ok(LabeledArray {
            array: array.into_dyn(),
            labels,
        })
    }

    /// Labels the axes `dim_0`, `dim_1`, ….
    pub fn with_default_labels<D: Dimension>(array: Array<Complex<f32>, D>) -> Self {
        let labels = (0..array.ndim()).map(|i| format!("dim_{}", i)).collect();
        LabeledArray {
            array: array.into_dyn(),
            labels,
        }
    }

    pub fn array(&self) -> &ArrayD<Complex<f32>> {
        &self.array
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// The axis carrying `label`, if any.
    pub fn axis(&self, label: &str) -> Option<Axis> {
        self.labels.iter().position(|l| l == label).map(Axis)
    }

    pub fn into_parts(self) -> (ArrayD<Complex<f32>>, Vec<String>) {
        (self.array, self.labels)
    }
}
