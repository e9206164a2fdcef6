use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use crate::error::{MlErr, Result};

/// A single training example as it travels through the streaming queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datapoint {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Datapoint {
    /// Creates a new `Datapoint`.
    ///
    /// # Arguments
    /// * `x` - The feature vector.
    /// * `y` - The label vector, a single value for regression models.
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Self {
        Self { x, y }
    }
}

/// An in-memory training set.
///
/// The samples are stored row-major in a single flat buffer, each row holding
/// `x_size` features followed by `y_size` labels.
#[derive(Debug, Clone)]
pub struct Dataset {
    data: Vec<f64>,
    x_size: usize,
    y_size: usize,
}

impl Dataset {
    /// Creates a new `Dataset`.
    ///
    /// # Arguments
    /// * `data` - The flat row-major buffer.
    /// * `x_size` - The amount of features per row.
    /// * `y_size` - The amount of labels per row.
    ///
    /// # Returns
    /// `MlErr::EmptyDataset` if there are no rows or no features, and
    /// `MlErr::DimensionMismatch` if the buffer isn't a whole amount of rows.
    pub fn new(data: Vec<f64>, x_size: usize, y_size: usize) -> Result<Self> {
        let row_size = x_size + y_size;

        if x_size == 0 || data.is_empty() {
            return Err(MlErr::EmptyDataset);
        }

        if data.len() % row_size != 0 {
            return Err(MlErr::DimensionMismatch {
                got: data.len() % row_size,
                expected: row_size,
            });
        }

        Ok(Self {
            data,
            x_size,
            y_size,
        })
    }

    /// Builds a `Dataset` from separate feature rows and scalar labels.
    pub fn from_rows(xs: &[Vec<f64>], ys: &[f64]) -> Result<Self> {
        let Some(first) = xs.first() else {
            return Err(MlErr::EmptyDataset);
        };

        if xs.len() != ys.len() {
            return Err(MlErr::DimensionMismatch {
                got: ys.len(),
                expected: xs.len(),
            });
        }

        let x_size = first.len();
        let mut data = Vec::with_capacity(xs.len() * (x_size + 1));

        for (x, &y) in xs.iter().zip(ys) {
            if x.len() != x_size {
                return Err(MlErr::DimensionMismatch {
                    got: x.len(),
                    expected: x_size,
                });
            }

            data.extend_from_slice(x);
            data.push(y);
        }

        Self::new(data, x_size, 1)
    }

    /// Builds an unlabeled `Dataset`, as used by the clustering models.
    pub fn unlabeled(xs: &[Vec<f64>]) -> Result<Self> {
        let Some(first) = xs.first() else {
            return Err(MlErr::EmptyDataset);
        };

        let x_size = first.len();
        let mut data = Vec::with_capacity(xs.len() * x_size);

        for x in xs {
            if x.len() != x_size {
                return Err(MlErr::DimensionMismatch {
                    got: x.len(),
                    expected: x_size,
                });
            }

            data.extend_from_slice(x);
        }

        Self::new(data, x_size, 0)
    }

    /// The amount of examples.
    pub fn len(&self) -> usize {
        self.data.len() / (self.x_size + self.y_size)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn x_size(&self) -> usize {
        self.x_size
    }

    pub fn y_size(&self) -> usize {
        self.y_size
    }

    /// The feature vector of the `i`-th example.
    pub fn x(&self, i: usize) -> &[f64] {
        let start = i * (self.x_size + self.y_size);
        &self.data[start..start + self.x_size]
    }

    /// The label vector of the `i`-th example.
    pub fn y(&self, i: usize) -> &[f64] {
        let start = i * (self.x_size + self.y_size) + self.x_size;
        &self.data[start..start + self.y_size]
    }

    /// A `(len, x_size)` view over the features only.
    pub fn features(&self) -> ArrayView2<'_, f64> {
        let full = ArrayView2::from_shape((self.len(), self.x_size + self.y_size), &self.data)
            .expect("the constructor validates the buffer is a whole amount of rows");

        full.split_at(ndarray::Axis(1), self.x_size).0
    }

    /// Iterates the examples in order.
    pub fn iter(&self) -> impl Iterator<Item = (&[f64], &[f64])> {
        (0..self.len()).map(|i| (self.x(i), self.y(i)))
    }
}
