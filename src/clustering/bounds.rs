use super::distance::CentroidDistances;

/// The distance bounds carried between iterations for a single point.
///
/// `lower[j]` never exceeds the true distance from the point to centroid `j` and
/// `upper` is never below the true distance to the assigned centroid. Every
/// pruning decision relies on both inequalities.
#[derive(Debug, Clone, PartialEq)]
pub struct Bound {
    /// The index of the currently assigned centroid.
    assigned: usize,
    /// A lower bound on the distance to each centroid.
    lower: Vec<f64>,
    /// An upper bound on the distance to the assigned centroid.
    upper: f64,
    /// Whether `upper` was loosened since it was last computed exactly.
    stale: bool,
}

impl Bound {
    /// Creates the bound of a point whose distance to every centroid is known.
    ///
    /// # Arguments
    /// * `distances` - The exact distance to each centroid.
    pub fn exact(distances: Vec<f64>) -> Self {
        let (assigned, upper) = distances
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::INFINITY), |best, (j, d)| if d < best.1 { (j, d) } else { best });

        Self {
            assigned,
            lower: distances,
            upper,
            stale: false,
        }
    }

    pub fn assigned(&self) -> usize {
        self.assigned
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Whether the point is certainly closer to its centroid than to any other one.
    pub fn is_settled(&self, dists: &CentroidDistances) -> bool {
        self.upper <= dists.nearest_half(self.assigned)
    }

    /// Whether centroid `j` could still be closer than the assigned one.
    pub fn may_move_to(&self, j: usize, dists: &CentroidDistances) -> bool {
        j != self.assigned
            && self.upper > self.lower[j]
            && self.upper > dists.half(self.assigned, j)
    }

    /// Tightens the bounds with the exact distance to the assigned centroid.
    pub fn refresh(&mut self, distance: f64) {
        self.lower[self.assigned] = distance;
        self.upper = distance;
        self.stale = false;
    }

    /// Records the exact distance to centroid `j`, reassigning the point if it's closer.
    pub fn offer(&mut self, j: usize, distance: f64) {
        self.lower[j] = distance;

        if distance < self.upper {
            self.assigned = j;
            self.upper = distance;
        }
    }

    /// Loosens the bounds after the centroids moved.
    ///
    /// By the triangle inequality a centroid that moved `δ` can't be more than
    /// `δ` closer nor farther than before, so the lower bounds shrink by its
    /// movement (never below zero) and the upper bound grows by the movement of
    /// the assigned centroid.
    ///
    /// # Arguments
    /// * `movements` - The distance each centroid moved.
    pub fn shift(&mut self, movements: &[f64]) {
        for (lower, movement) in self.lower.iter_mut().zip(movements) {
            *lower = (*lower - movement).max(0.);
        }

        self.upper += movements[self.assigned];
        self.stale = true;
    }
}
