//! Capability selection.
//!
//! Two exclusive flags encode a three-way choice. They are collapsed into a
//! single [`CapabilitySelection`] once at startup so nothing downstream has to
//! re-check flag combinations.

use thiserror::Error;

use crate::config::schema::{CONTROLLER_ONLY_ENV, NODE_ONLY_ENV};

/// A service role the plugin can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    ControlPlane,
    NodePlane,
}

/// Which roles this process hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilitySelection {
    NodeOnly,
    ControllerOnly,
    Both,
}

impl CapabilitySelection {
    pub fn capabilities(self) -> CapabilitySet {
        match self {
            CapabilitySelection::NodeOnly => CapabilitySet {
                control_plane: false,
                node_plane: true,
            },
            CapabilitySelection::ControllerOnly => CapabilitySet {
                control_plane: true,
                node_plane: false,
            },
            CapabilitySelection::Both => CapabilitySet {
                control_plane: true,
                node_plane: true,
            },
        }
    }
}

/// Non-empty set of selected capabilities.
///
/// Only obtainable from a [`CapabilitySelection`], which rules out the empty
/// set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilitySet {
    control_plane: bool,
    node_plane: bool,
}

impl CapabilitySet {
    pub fn contains(&self, capability: Capability) -> bool {
        match capability {
            Capability::ControlPlane => self.control_plane,
            Capability::NodePlane => self.node_plane,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        [Capability::ControlPlane, Capability::NodePlane]
            .into_iter()
            .filter(move |c| self.contains(*c))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Both exclusive role flags were set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot specify both {node_flag} and {controller_flag}")]
pub struct Misconfiguration {
    pub node_flag: &'static str,
    pub controller_flag: &'static str,
}

/// Map the two role flags onto a selection.
pub fn select(node_only: bool, controller_only: bool) -> Result<CapabilitySelection, Misconfiguration> {
    match (node_only, controller_only) {
        (true, true) => Err(Misconfiguration {
            node_flag: NODE_ONLY_ENV,
            controller_flag: CONTROLLER_ONLY_ENV,
        }),
        (true, false) => Ok(CapabilitySelection::NodeOnly),
        (false, true) => Ok(CapabilitySelection::ControllerOnly),
        (false, false) => Ok(CapabilitySelection::Both),
    }
}
