//! Implicit-value and restored-space queries over block meshes.
//!
//! Each block carries a [`ScalarFieldQuery`] for the implicit value and a
//! [`CoordinateTransform`] for stratigraphic coordinates; the
//! [`ImplicitModel`] ties them to the horizons stack.

pub mod builder;
pub mod coordinate_transform;
pub mod model;
pub mod scalar_field;
pub mod stratigraphic_point;

pub use builder::ImplicitModelBuilder;
pub use coordinate_transform::CoordinateTransform;
pub use model::{ImplicitModel, IsovalueDirection, StratigraphicModel, StratigraphicSection};
pub use scalar_field::{QueryConfig, ScalarFieldQuery};
pub use stratigraphic_point::StratigraphicPoint;
