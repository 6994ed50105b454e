//! What the previous pass produced, kept as the reuse and diff input for the
//! next one.

use std::collections::BTreeMap;

use super::flatten::Flattened;
use crate::model::{Asset, Atom, CanvasConfig, Clump};
use crate::scene::DisplayId;

/// A rendered clump. `source` holds the clump's own properties only; its
/// children live in `elements`.
#[derive(Debug, Clone)]
pub struct HierarchyClump {
    pub source: Clump,
    /// Carries the clump transform and the pointer identity.
    pub container: DisplayId,
    /// Holds the children's displays, hidden while `flattened` stands in.
    pub content: DisplayId,
    pub flattened: Option<Flattened>,
    pub mask: Option<DisplayId>,
    pub elements: Vec<HierarchyElement>,
}

#[derive(Debug, Clone)]
pub struct HierarchyAtom {
    pub source: Atom,
    /// `None` when the atom rendered as absent.
    pub display: Option<DisplayId>,
}

#[derive(Debug, Clone)]
pub enum HierarchyElement {
    Clump(HierarchyClump),
    Atom(HierarchyAtom),
}

/// Element class, used with the `nodeUUID` to match siblings across passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementClass {
    Clump,
    Atom,
}

impl HierarchyElement {
    pub fn class(&self) -> ElementClass {
        match self {
            HierarchyElement::Clump(_) => ElementClass::Clump,
            HierarchyElement::Atom(_) => ElementClass::Atom,
        }
    }

    pub fn node_uuid(&self) -> &str {
        match self {
            HierarchyElement::Clump(c) => &c.source.node_uuid,
            HierarchyElement::Atom(a) => &a.source.node_uuid,
        }
    }

    /// The display node the parent adds to its content.
    pub fn display(&self) -> Option<DisplayId> {
        match self {
            HierarchyElement::Clump(c) => Some(c.container),
            HierarchyElement::Atom(a) => a.display,
        }
    }
}

impl HierarchyClump {
    /// Depth-first search for a clump by `nodeUUID`, this clump included.
    pub fn find(&self, node_uuid: &str) -> Option<&HierarchyClump> {
        if self.source.node_uuid == node_uuid {
            return Some(self);
        }
        self.elements.iter().find_map(|element| match element {
            HierarchyElement::Clump(child) => child.find(node_uuid),
            HierarchyElement::Atom(_) => None,
        })
    }

    pub fn find_mut(&mut self, node_uuid: &str) -> Option<&mut HierarchyClump> {
        if self.source.node_uuid == node_uuid {
            return Some(self);
        }
        self.elements.iter_mut().find_map(|element| match element {
            HierarchyElement::Clump(child) => child.find_mut(node_uuid),
            HierarchyElement::Atom(_) => None,
        })
    }
}

/// The canvas as last rendered.
#[derive(Debug, Clone, Default)]
pub struct HierarchyCanvas {
    pub assets: BTreeMap<String, Asset>,
    pub config: Option<CanvasConfig>,
    pub content: Option<HierarchyClump>,
}
