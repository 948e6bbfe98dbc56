//! Axis-aligned bounding boxes in 2-D and 3-D.

/// Axis-aligned box; starts empty and grows with [`add_point`](Self::add_point).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox<const D: usize> {
    min: [f64; D],
    max: [f64; D],
}

impl<const D: usize> Default for BoundingBox<D> {
    fn default() -> Self {
        Self {
            min: [f64::INFINITY; D],
            max: [f64::NEG_INFINITY; D],
        }
    }
}

impl<const D: usize> BoundingBox<D> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a [f64; D]>) -> Self {
        let mut bbox = Self::new();
        for p in points {
            bbox.add_point(p);
        }
        bbox
    }

    pub fn add_point(&mut self, point: &[f64; D]) {
        for d in 0..D {
            self.min[d] = self.min[d].min(point[d]);
            self.max[d] = self.max[d].max(point[d]);
        }
    }

    pub fn add_box(&mut self, other: &BoundingBox<D>) {
        if other.is_empty() {
            return;
        }
        self.add_point(&other.min);
        self.add_point(&other.max);
    }

    /// `true` until a point has been added.
    pub fn is_empty(&self) -> bool {
        (0..D).any(|d| self.min[d] > self.max[d])
    }

    #[inline]
    pub fn min(&self) -> &[f64; D] {
        &self.min
    }

    #[inline]
    pub fn max(&self) -> &[f64; D] {
        &self.max
    }

    pub fn contains(&self, point: &[f64; D]) -> bool {
        (0..D).all(|d| self.min[d] <= point[d] && point[d] <= self.max[d])
    }

    /// Length of the min-max diagonal; zero for an empty box.
    pub fn diagonal_length(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        (0..D)
            .map(|d| (self.max[d] - self.min[d]).powi(2))
            .sum::<f64>()
            .sqrt()
    }
}
