//! Component kinds of a stratigraphic model.

use crate::topology::component_id::ComponentId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind tag used in diagnostics and [`NotFound`](crate::strata_error::StrataError::NotFound) errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentType {
    Horizon,
    StratigraphicUnit,
    /// Meshed volume (3-D model) or meshed surface (2-D section).
    Block,
    /// Interface between blocks: a surface in 3-D, a line in 2-D.
    Boundary,
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComponentType::Horizon => "Horizon",
            ComponentType::StratigraphicUnit => "StratigraphicUnit",
            ComponentType::Block => "Block",
            ComponentType::Boundary => "Boundary",
        };
        f.write_str(s)
    }
}

/// How a horizon relates to the units around it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactType {
    #[default]
    Conformal,
    /// Truncates the unit under it.
    Erosion,
    /// The unit above laps onto it.
    Baselap,
    /// Both erosion and baselap.
    Discontinuity,
    Topography,
    Intrusion,
}

impl fmt::Display for ContactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContactType::Conformal => "conformal",
            ContactType::Erosion => "erosion",
            ContactType::Baselap => "baselap",
            ContactType::Discontinuity => "discontinuity",
            ContactType::Topography => "topography",
            ContactType::Intrusion => "intrusion",
        };
        f.write_str(s)
    }
}

/// Shared surface of registry-stored components.
pub trait Component {
    const TYPE: ComponentType;

    fn id(&self) -> ComponentId;
    fn name(&self) -> Option<&str>;
    fn set_name(&mut self, name: Option<String>);
}

/// Boundary surface between two stratigraphic units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Horizon {
    id: ComponentId,
    name: Option<String>,
    contact_type: ContactType,
}

impl Horizon {
    pub fn new(id: ComponentId, name: Option<String>) -> Self {
        Self {
            id,
            name,
            contact_type: ContactType::default(),
        }
    }

    #[inline]
    pub fn contact_type(&self) -> ContactType {
        self.contact_type
    }

    pub(crate) fn set_contact_type(&mut self, contact_type: ContactType) {
        self.contact_type = contact_type;
    }
}

impl Component for Horizon {
    const TYPE: ComponentType = ComponentType::Horizon;

    fn id(&self) -> ComponentId {
        self.id
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }
}

/// A named rock layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StratigraphicUnit {
    id: ComponentId,
    name: Option<String>,
}

impl StratigraphicUnit {
    pub fn new(id: ComponentId, name: Option<String>) -> Self {
        Self { id, name }
    }
}

impl Component for StratigraphicUnit {
    const TYPE: ComponentType = ComponentType::StratigraphicUnit;

    fn id(&self) -> ComponentId {
        self.id
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }
}
