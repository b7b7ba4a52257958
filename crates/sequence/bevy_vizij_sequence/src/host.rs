//! `SceneHost` over a Bevy `World`.
//!
//! Transforms are read from local `Transform`s composed up the `Parent` chain,
//! so world-space reads stay correct inside a tick before transform
//! propagation has run. Colors live on `StandardMaterial` assets addressed
//! through the [`MaterialTable`].

use bevy::prelude::*;
use vizij_sequence_core::{
    ColorProperty, ComponentId, EntityId, MaterialId, Rgba, SceneHost, Space, ToggleTarget,
};

use crate::components::SequenceInactive;
use crate::resources::MaterialTable;

#[inline]
pub fn entity_id(entity: Entity) -> EntityId {
    EntityId(entity.to_bits())
}

/// Toggle handle for an entity's components. Bevy has no per-component
/// enable flag, so component and collider toggles mark the owning entity.
#[inline]
pub fn component_id(entity: Entity) -> ComponentId {
    ComponentId(entity.to_bits())
}

#[inline]
pub fn to_entity(id: EntityId) -> Option<Entity> {
    Entity::try_from_bits(id.0).ok()
}

pub struct BevyScene<'w> {
    world: &'w mut World,
}

impl<'w> BevyScene<'w> {
    pub fn new(world: &'w mut World) -> Self {
        Self { world }
    }

    pub fn world(&self) -> &World {
        self.world
    }

    fn live(&self, id: EntityId) -> Option<Entity> {
        to_entity(id).filter(|e| self.world.get_entity(*e).is_some())
    }

    fn local(&self, entity: Entity) -> Transform {
        self.world
            .get::<Transform>(entity)
            .copied()
            .unwrap_or_default()
    }

    fn global(&self, entity: Entity) -> Transform {
        let local = self.local(entity);
        match self.world.get::<Parent>(entity) {
            Some(parent) => self.global(parent.get()).mul_transform(local),
            None => local,
        }
    }

    fn parent_global(&self, entity: Entity) -> Transform {
        match self.world.get::<Parent>(entity) {
            Some(parent) => self.global(parent.get()),
            None => Transform::IDENTITY,
        }
    }

    fn edit_transform(&mut self, entity: Entity, f: impl FnOnce(&mut Transform)) {
        if let Some(mut tf) = self.world.get_mut::<Transform>(entity) {
            f(&mut tf);
        }
    }

    fn is_self_or_ancestor(&self, candidate: Entity, mut entity: Entity) -> bool {
        loop {
            if entity == candidate {
                return true;
            }
            match self.world.get::<Parent>(entity) {
                Some(p) => entity = p.get(),
                None => return false,
            }
        }
    }

    fn collect_materials(&self, entity: Entity, table: &MaterialTable, out: &mut Vec<MaterialId>) {
        if let Some(handle) = self.world.get::<Handle<StandardMaterial>>(entity) {
            match table.id_of(handle.id()) {
                Some(id) => out.push(id),
                None => trace!("material {:?} not registered yet", handle.id()),
            }
        }
        if let Some(children) = self.world.get::<Children>(entity) {
            for &child in children.iter() {
                self.collect_materials(child, table, out);
            }
        }
    }
}

fn to_local_point(parent: &Transform, world: Vec3) -> Vec3 {
    let p = parent.rotation.inverse() * (world - parent.translation);
    let s = parent.scale;
    let safe = |n: f32, d: f32| if d == 0.0 { 0.0 } else { n / d };
    Vec3::new(safe(p.x, s.x), safe(p.y, s.y), safe(p.z, s.z))
}

impl SceneHost for BevyScene<'_> {
    fn position(&self, entity: EntityId, space: Space) -> [f32; 3] {
        let Some(e) = self.live(entity) else {
            return [0.0; 3];
        };
        match space {
            Space::Local => self.local(e).translation.to_array(),
            Space::World => self.global(e).translation.to_array(),
        }
    }

    fn set_position(&mut self, entity: EntityId, space: Space, value: [f32; 3]) {
        let Some(e) = self.live(entity) else {
            return;
        };
        let v = Vec3::from_array(value);
        let local = match space {
            Space::Local => v,
            Space::World => to_local_point(&self.parent_global(e), v),
        };
        self.edit_transform(e, |tf| tf.translation = local);
    }

    fn rotation(&self, entity: EntityId, space: Space) -> [f32; 4] {
        let Some(e) = self.live(entity) else {
            return Quat::IDENTITY.to_array();
        };
        match space {
            Space::Local => self.local(e).rotation.to_array(),
            Space::World => self.global(e).rotation.to_array(),
        }
    }

    fn set_rotation(&mut self, entity: EntityId, space: Space, value: [f32; 4]) {
        let Some(e) = self.live(entity) else {
            return;
        };
        let q = Quat::from_array(value);
        let local = match space {
            Space::Local => q,
            Space::World => self.parent_global(e).rotation.inverse() * q,
        };
        self.edit_transform(e, |tf| tf.rotation = local);
    }

    fn scale(&self, entity: EntityId) -> [f32; 3] {
        match self.live(entity) {
            Some(e) => self.local(e).scale.to_array(),
            None => [1.0; 3],
        }
    }

    fn set_scale(&mut self, entity: EntityId, value: [f32; 3]) {
        if let Some(e) = self.live(entity) {
            self.edit_transform(e, |tf| tf.scale = Vec3::from_array(value));
        }
    }

    fn set_parent(&mut self, entity: EntityId, parent: Option<EntityId>, keep_world: bool) {
        let Some(e) = self.live(entity) else {
            return;
        };
        let parent = match parent {
            Some(p) => match self.live(p) {
                Some(p) if !self.is_self_or_ancestor(e, p) => Some(p),
                _ => {
                    warn!("ignoring reparent of {e:?} under {p:?}");
                    return;
                }
            },
            None => None,
        };

        let before = self.global(e);
        match parent {
            Some(p) => {
                self.world.entity_mut(e).set_parent(p);
            }
            None => {
                self.world.entity_mut(e).remove_parent();
            }
        }
        if keep_world {
            let frame = self.parent_global(e);
            let s = frame.scale;
            let safe = |n: f32, d: f32| if d == 0.0 { 0.0 } else { n / d };
            let local = Transform {
                translation: to_local_point(&frame, before.translation),
                rotation: frame.rotation.inverse() * before.rotation,
                scale: Vec3::new(
                    safe(before.scale.x, s.x),
                    safe(before.scale.y, s.y),
                    safe(before.scale.z, s.z),
                ),
            };
            self.edit_transform(e, |tf| *tf = local);
        }
    }

    fn materials(&self, entity: EntityId) -> Vec<MaterialId> {
        let mut out = Vec::new();
        let table = self.world.get_resource::<MaterialTable>();
        if let (Some(e), Some(table)) = (self.live(entity), table) {
            self.collect_materials(e, table, &mut out);
        }
        out
    }

    fn material_color(&self, material: MaterialId, property: &ColorProperty) -> Option<Rgba> {
        let asset = self.world.get_resource::<MaterialTable>()?.asset_of(material)?;
        let mat = self.world.get_resource::<Assets<StandardMaterial>>()?.get(asset)?;
        match property.as_str() {
            "color" | "base_color" => {
                let c = mat.base_color.to_srgba();
                Some([c.red, c.green, c.blue, c.alpha])
            }
            "emissive" => {
                let e = mat.emissive;
                Some([e.red, e.green, e.blue, e.alpha])
            }
            _ => None,
        }
    }

    fn set_material_color(&mut self, material: MaterialId, property: &ColorProperty, value: Rgba) {
        let Some(asset) = self
            .world
            .get_resource::<MaterialTable>()
            .and_then(|t| t.asset_of(material))
        else {
            return;
        };
        let Some(mut assets) = self.world.get_resource_mut::<Assets<StandardMaterial>>() else {
            return;
        };
        let Some(mat) = assets.get_mut(asset) else {
            return;
        };
        let [r, g, b, a] = value;
        match property.as_str() {
            "color" | "base_color" => mat.base_color = Color::srgba(r, g, b, a),
            "emissive" => mat.emissive = LinearRgba::new(r, g, b, a),
            _ => {}
        }
    }

    fn set_active(&mut self, target: ToggleTarget, active: bool) {
        let (entity, visibility, marker) = match target {
            ToggleTarget::Entity(id) => (id, true, true),
            ToggleTarget::Renderable(c) => (EntityId(c.0), true, false),
            ToggleTarget::Component(c) | ToggleTarget::Collider(c) => (EntityId(c.0), false, true),
        };
        let Some(e) = self.live(entity) else {
            return;
        };
        let mut entity = self.world.entity_mut(e);
        if visibility {
            entity.insert(if active {
                Visibility::Inherited
            } else {
                Visibility::Hidden
            });
        }
        if marker {
            if active {
                entity.remove::<SequenceInactive>();
            } else {
                entity.insert(SequenceInactive);
            }
        }
    }
}
