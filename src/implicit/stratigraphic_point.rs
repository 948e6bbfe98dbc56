//! Restored-space coordinates.

use crate::strata_error::StrataError;
use std::fmt;

/// A point in restored (stratigraphic) space: a `D - 1` dimensional location
/// followed by the implicit value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StratigraphicPoint<const D: usize> {
    coordinates: [f64; D],
}

pub type StratigraphicPoint2D = StratigraphicPoint<2>;
pub type StratigraphicPoint3D = StratigraphicPoint<3>;

impl<const D: usize> StratigraphicPoint<D> {
    pub fn new(location: &[f64], implicit_value: f64) -> Result<Self, StrataError> {
        if location.len() + 1 != D {
            return Err(StrataError::DimensionMismatch {
                expected: D - 1,
                found: location.len(),
            });
        }
        let mut coordinates = [0.0; D];
        coordinates[..D - 1].copy_from_slice(location);
        coordinates[D - 1] = implicit_value;
        Ok(Self { coordinates })
    }

    #[inline]
    pub fn from_coordinates(coordinates: [f64; D]) -> Self {
        Self { coordinates }
    }

    #[inline]
    pub fn location(&self) -> &[f64] {
        &self.coordinates[..D - 1]
    }

    #[inline]
    pub fn implicit_value(&self) -> f64 {
        self.coordinates[D - 1]
    }

    /// Location followed by the implicit value.
    #[inline]
    pub fn stratigraphic_coordinates(&self) -> &[f64; D] {
        &self.coordinates
    }

    pub fn set_implicit_value(&mut self, value: f64) {
        self.coordinates[D - 1] = value;
    }
}

impl<const D: usize> fmt::Display for StratigraphicPoint<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, x) in self.location().iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{x}")?;
        }
        write!(f, " | {})", self.implicit_value())
    }
}
