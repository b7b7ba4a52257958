//! Host-facing traits.
//!
//! The core never owns scene state. Adapters (Bevy, the in-memory reference
//! scene, game engines) implement [`SceneHost`] and pass it into
//! `Scheduler::tick()`; stored sequences additionally resolve target names
//! through a [`TargetResolver`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::{ComponentId, EntityId, MaterialId};
use crate::math::{Quat, Rgba, Vec3};

/// Coordinate space for position and rotation reads/writes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Space {
    /// Relative to the entity's parent.
    #[default]
    Local,
    World,
}

/// Name of a color property on a material (e.g. `"color"`, `"emissive"`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorProperty(String);

impl ColorProperty {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ColorProperty {
    fn default() -> Self {
        Self("color".to_string())
    }
}

impl fmt::Display for ColorProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ColorProperty {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Something a `ToggleActive` instruction enables or disables.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ToggleTarget {
    Entity(EntityId),
    Component(ComponentId),
    Collider(ComponentId),
    Renderable(ComponentId),
}

/// Scene access consumed by the scheduler.
///
/// Reads of unknown entities should return identity values (zero position,
/// identity rotation, unit scale); writes to unknown targets should be ignored.
pub trait SceneHost {
    fn position(&self, entity: EntityId, space: Space) -> Vec3;
    fn set_position(&mut self, entity: EntityId, space: Space, value: Vec3);

    fn rotation(&self, entity: EntityId, space: Space) -> Quat;
    fn set_rotation(&mut self, entity: EntityId, space: Space, value: Quat);

    /// Local scale.
    fn scale(&self, entity: EntityId) -> Vec3;
    fn set_scale(&mut self, entity: EntityId, value: Vec3);

    /// Attach `entity` under `parent` (or detach with `None`). With
    /// `keep_world` the world pose is preserved, otherwise the local pose is.
    fn set_parent(&mut self, entity: EntityId, parent: Option<EntityId>, keep_world: bool);

    /// Materials currently attached to the entity's renderables, in a stable order.
    fn materials(&self, entity: EntityId) -> Vec<MaterialId>;

    /// `None` when the material lacks the property.
    fn material_color(&self, material: MaterialId, property: &ColorProperty) -> Option<Rgba>;
    fn set_material_color(&mut self, material: MaterialId, property: &ColorProperty, value: Rgba);

    fn set_active(&mut self, target: ToggleTarget, active: bool);
}

/// Resolves the target names used by stored sequences into host entities.
pub trait TargetResolver {
    fn resolve(&mut self, name: &str) -> Option<EntityId>;
}

impl TargetResolver for hashbrown::HashMap<String, EntityId> {
    fn resolve(&mut self, name: &str) -> Option<EntityId> {
        self.get(name).copied()
    }
}
