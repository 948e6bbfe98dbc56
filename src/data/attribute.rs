//! Named per-vertex attribute storage.
//!
//! A [`VertexSection`] stores a fixed-width `f64` slice for every vertex of a
//! mesh in one contiguous buffer: scalar fields have width 1, restored
//! locations width `D - 1`. [`AttributeManager`] groups sections by name and
//! keeps them sized to the mesh vertex count.

use crate::strata_error::StrataError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VertexSection {
    width: usize,
    default: Vec<f64>,
    values: Vec<f64>,
}

impl VertexSection {
    /// Section of `nb_vertices` slices, each initialised to `default`.
    pub fn new(nb_vertices: usize, default: &[f64]) -> Self {
        let mut section = Self {
            width: default.len(),
            default: default.to_vec(),
            values: Vec::new(),
        };
        section.resize(nb_vertices);
        section
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn nb_vertices(&self) -> usize {
        self.values.len().checked_div(self.width).unwrap_or(0)
    }

    /// Read-only view of the slice for `vertex`.
    pub fn try_restrict(&self, vertex: usize) -> Result<&[f64], StrataError> {
        let start = self.start(vertex)?;
        Ok(&self.values[start..start + self.width])
    }

    pub fn try_restrict_mut(&mut self, vertex: usize) -> Result<&mut [f64], StrataError> {
        let start = self.start(vertex)?;
        Ok(&mut self.values[start..start + self.width])
    }

    /// Overwrites the slice for `vertex`; `value` must match the width.
    pub fn try_set(&mut self, vertex: usize, value: &[f64]) -> Result<(), StrataError> {
        if value.len() != self.width {
            return Err(StrataError::DimensionMismatch {
                expected: self.width,
                found: value.len(),
            });
        }
        self.try_restrict_mut(vertex)?.copy_from_slice(value);
        Ok(())
    }

    /// Scalar value of a width-1 section.
    pub fn scalar(&self, vertex: usize) -> Result<f64, StrataError> {
        Ok(self.try_restrict(vertex)?[0])
    }

    /// Raw buffer, `width` values per vertex.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Applies `f` to every stored value.
    pub fn map_in_place(&mut self, f: impl Fn(f64) -> f64) {
        for v in &mut self.values {
            *v = f(*v);
        }
    }

    pub(crate) fn resize(&mut self, nb_vertices: usize) {
        let mut values = std::mem::take(&mut self.values);
        values.truncate(nb_vertices * self.width);
        while values.len() < nb_vertices * self.width {
            values.extend_from_slice(&self.default);
        }
        self.values = values;
    }

    fn start(&self, vertex: usize) -> Result<usize, StrataError> {
        let nb_vertices = self.nb_vertices();
        if vertex >= nb_vertices || self.width == 0 {
            return Err(StrataError::VertexOutOfRange {
                vertex,
                nb_vertices,
            });
        }
        Ok(vertex * self.width)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeManager {
    nb_vertices: usize,
    sections: BTreeMap<String, VertexSection>,
}

impl AttributeManager {
    pub fn new(nb_vertices: usize) -> Self {
        Self {
            nb_vertices,
            sections: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn attribute_exists(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    pub fn find(&self, name: &str) -> Option<&VertexSection> {
        self.sections.get(name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut VertexSection> {
        self.sections.get_mut(name)
    }

    /// Like [`find`](Self::find), but a missing attribute is a
    /// [`StrataError::PreconditionViolated`].
    pub fn require(&self, name: &str) -> Result<&VertexSection, StrataError> {
        self.sections.get(name).ok_or_else(|| {
            StrataError::PreconditionViolated(format!(
                "vertex attribute `{name}` has not been instantiated"
            ))
        })
    }

    /// Returns the attribute `name`, creating it filled with `default` if
    /// missing. Reopening with a different width fails.
    pub fn find_or_create(
        &mut self,
        name: &str,
        default: &[f64],
    ) -> Result<&mut VertexSection, StrataError> {
        let nb_vertices = self.nb_vertices;
        let section = self
            .sections
            .entry(name.to_owned())
            .or_insert_with(|| VertexSection::new(nb_vertices, default));
        if section.width() != default.len() {
            return Err(StrataError::AttributeWidthMismatch {
                name: name.to_owned(),
                expected: default.len(),
                found: section.width(),
            });
        }
        Ok(section)
    }

    pub fn remove(&mut self, name: &str) -> Option<VertexSection> {
        self.sections.remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub(crate) fn resize(&mut self, nb_vertices: usize) {
        self.nb_vertices = nb_vertices;
        for section in self.sections.values_mut() {
            section.resize(nb_vertices);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_restrict() {
        let mut s = VertexSection::new(3, &[0.0, 0.0]);
        assert_eq!(s.width(), 2);
        assert_eq!(s.nb_vertices(), 3);
        s.try_set(1, &[4.0, 5.0]).unwrap();
        assert_eq!(s.try_restrict(1).unwrap(), &[4.0, 5.0]);
        assert_eq!(s.as_slice(), &[0.0, 0.0, 4.0, 5.0, 0.0, 0.0]);
    }

    #[test]
    fn out_of_range_and_width_errors() {
        let mut s = VertexSection::new(2, &[1.0]);
        assert_eq!(
            s.try_restrict(2).unwrap_err(),
            StrataError::VertexOutOfRange {
                vertex: 2,
                nb_vertices: 2
            }
        );
        assert_eq!(
            s.try_set(0, &[1.0, 2.0]).unwrap_err(),
            StrataError::DimensionMismatch {
                expected: 1,
                found: 2
            }
        );
    }

    #[test]
    fn find_or_create_reopens_existing() {
        let mut attrs = AttributeManager::new(2);
        attrs
            .find_or_create("implicit", &[0.0])
            .unwrap()
            .try_set(1, &[7.0])
            .unwrap();
        let again = attrs.find_or_create("implicit", &[0.0]).unwrap();
        assert_eq!(again.scalar(1).unwrap(), 7.0, "existing values survive");
        assert!(matches!(
            attrs.find_or_create("implicit", &[0.0, 0.0]),
            Err(StrataError::AttributeWidthMismatch { .. })
        ));
    }

    #[test]
    fn require_missing_is_precondition_violation() {
        let attrs = AttributeManager::new(1);
        assert!(matches!(
            attrs.require("nope"),
            Err(StrataError::PreconditionViolated(_))
        ));
    }

    #[test]
    fn resize_fills_with_default() {
        let mut attrs = AttributeManager::new(1);
        attrs.find_or_create("v", &[3.0]).unwrap();
        attrs.resize(3);
        assert_eq!(attrs.find("v").unwrap().as_slice(), &[3.0, 3.0, 3.0]);
        attrs.resize(1);
        assert_eq!(attrs.find("v").unwrap().nb_vertices(), 1);
    }
}
