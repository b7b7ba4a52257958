//! Volatile fade reconciliation.
//!
//! Hosts may replace a renderer's materials while a fade is running (a shared
//! material becoming an instance copy on first write is the common case). A
//! volatile fade re-reads the live list every tick and rebuilds its working
//! list when it changed: surviving materials keep their snapshot, new ones
//! snapshot their own current color.

use hashbrown::HashMap;

use crate::host::{ColorProperty, SceneHost};
use crate::ids::MaterialId;
use crate::math::{Rgba, WHITE};

/// Working materials of one running fade and the color each started from.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FadeState {
    pub materials: Vec<MaterialId>,
    pub from: Vec<Rgba>,
}

impl FadeState {
    /// Snapshot the current color of every material.
    pub fn capture(
        materials: &[MaterialId],
        property: &ColorProperty,
        host: &dyn SceneHost,
    ) -> Self {
        Self {
            materials: materials.to_vec(),
            from: materials
                .iter()
                .map(|m| read_color(host, *m, property))
                .collect(),
        }
    }
}

/// Summary of one rebuild.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Reconciliation {
    pub materials: usize,
    pub carried_over: usize,
}

#[inline]
pub(crate) fn read_color(host: &dyn SceneHost, material: MaterialId, property: &ColorProperty) -> Rgba {
    host.material_color(material, property).unwrap_or(WHITE)
}

/// Bring `state` in line with `live`. Returns `None` when nothing changed.
pub fn reconcile(
    state: &mut FadeState,
    live: Vec<MaterialId>,
    property: &ColorProperty,
    host: &dyn SceneHost,
) -> Option<Reconciliation> {
    if live == state.materials {
        return None;
    }

    let previous: HashMap<MaterialId, Rgba> = state
        .materials
        .iter()
        .copied()
        .zip(state.from.iter().copied())
        .collect();

    let mut carried_over = 0usize;
    let from: Vec<Rgba> = live
        .iter()
        .map(|m| match previous.get(m) {
            Some(color) => {
                carried_over += 1;
                *color
            }
            None => read_color(host, *m, property),
        })
        .collect();

    let summary = Reconciliation {
        materials: live.len(),
        carried_over,
    };
    state.materials = live;
    state.from = from;
    Some(summary)
}
