//! Bulk edits of the implicit and restored-location attributes.

use crate::implicit::builder::ImplicitModelBuilder;
use crate::implicit::model::{IMPLICIT_ATTRIBUTE_NAME, STRATIGRAPHIC_LOCATION_ATTRIBUTE_NAME};
use crate::strata_error::StrataError;
use crate::topology::component::Component;
use itertools::{Itertools, MinMaxResult};

/// Multiplies every vertex implicit value and every horizon isovalue by
/// `factor`. Blocks without the implicit attribute are left untouched.
pub fn rescale_implicit_value<const D: usize>(
    builder: &mut ImplicitModelBuilder<'_, D>,
    factor: f64,
) -> Result<(), StrataError> {
    if !factor.is_finite() || factor == 0.0 {
        return Err(StrataError::PreconditionViolated(format!(
            "cannot rescale implicit values by {factor}"
        )));
    }
    for (_, mesh) in builder.block_meshes_mut() {
        if let Some(section) = mesh.vertex_attributes_mut().find_mut(IMPLICIT_ATTRIBUTE_NAME) {
            section.map_in_place(|v| v * factor);
        }
    }
    for (_, value) in builder.horizon_isovalues_mut() {
        *value *= factor;
    }
    Ok(())
}

/// Rescales so that the isovalue span matches the model bounding-box
/// diagonal. Returns the factor applied.
pub fn rescale_implicit_value_to_bbox_scale<const D: usize>(
    builder: &mut ImplicitModelBuilder<'_, D>,
) -> Result<f64, StrataError> {
    let model = builder.model();
    let span = match model
        .horizons_stack()
        .horizons()
        .filter_map(|h| model.horizon_implicit_value(h.id()))
        .minmax_by(f64::total_cmp)
    {
        MinMaxResult::MinMax(min, max) if max > min => max - min,
        _ => {
            return Err(StrataError::PreconditionViolated(
                "rescaling needs two horizons with distinct isovalues".into(),
            ));
        }
    };
    let diagonal = model.bounding_box().diagonal_length();
    let factor = diagonal / span;
    rescale_implicit_value(builder, factor)?;
    log::debug!("[Rescale] implicit values scaled by {factor} (diagonal {diagonal}, span {span})");
    Ok(factor)
}

/// Sets every restored location to the geometric coordinates without the
/// last axis.
pub fn stratigraphic_location_from_axes<const D: usize>(
    builder: &mut ImplicitModelBuilder<'_, D>,
) -> Result<(), StrataError> {
    let default = vec![0.0; D - 1];
    for (_, mesh) in builder.block_meshes_mut() {
        let points = mesh.points().to_vec();
        let section = mesh
            .vertex_attributes_mut()
            .find_or_create(STRATIGRAPHIC_LOCATION_ATTRIBUTE_NAME, &default)?;
        for (v, p) in points.iter().enumerate() {
            section.try_set(v, &p[..D - 1])?;
        }
    }
    Ok(())
}

/// Copies the width-1 attribute `name` into the implicit attribute of every
/// block. Every block must carry `name`.
pub fn implicit_value_from_scalar_attribute<const D: usize>(
    builder: &mut ImplicitModelBuilder<'_, D>,
    name: &str,
) -> Result<(), StrataError> {
    for (block, mesh) in builder.block_meshes_mut() {
        let source = mesh.vertex_attributes().find(name).ok_or_else(|| {
            StrataError::PreconditionViolated(format!(
                "block `{block}` has no vertex attribute `{name}`"
            ))
        })?;
        if source.width() != 1 {
            return Err(StrataError::AttributeWidthMismatch {
                name: name.to_owned(),
                expected: 1,
                found: source.width(),
            });
        }
        let values = source.as_slice().to_vec();
        let target = mesh
            .vertex_attributes_mut()
            .find_or_create(IMPLICIT_ATTRIBUTE_NAME, &[0.0])?;
        for (v, value) in values.into_iter().enumerate() {
            target.try_set(v, &[value])?;
        }
    }
    Ok(())
}
