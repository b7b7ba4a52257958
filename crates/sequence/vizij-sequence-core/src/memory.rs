//! In-memory scene host.
//!
//! A small scene graph (local TRS + parent links, named color properties per
//! material, active flags) implementing [`SceneHost`]. Useful for headless
//! runs, tests and benchmarks, and as a reference for adapter authors.

use hashbrown::HashMap;

use crate::host::{ColorProperty, SceneHost, Space, TargetResolver, ToggleTarget};
use crate::ids::{ComponentId, EntityId, MaterialId};
use crate::math::{
    add3, div3, mul3, quat_conjugate, quat_mul, quat_rotate, sub3, Quat, Rgba, Vec3, IDENTITY,
    ONE, ZERO,
};

#[derive(Clone, Debug)]
pub struct Node {
    pub name: String,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub parent: Option<EntityId>,
    pub active: bool,
    pub materials: Vec<MaterialId>,
}

#[derive(Clone, Debug, Default)]
pub struct Material {
    pub colors: HashMap<String, Rgba>,
}

#[derive(Debug, Default)]
pub struct MemoryScene {
    nodes: HashMap<EntityId, Node>,
    materials: HashMap<MaterialId, Material>,
    components: HashMap<ComponentId, bool>,
    next_id: u64,
    writes: usize,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn spawn(&mut self, name: &str) -> EntityId {
        self.spawn_at(name, ZERO)
    }

    pub fn spawn_at(&mut self, name: &str, position: Vec3) -> EntityId {
        let id = EntityId(self.alloc());
        self.nodes.insert(
            id,
            Node {
                name: name.to_string(),
                position,
                rotation: IDENTITY,
                scale: ONE,
                parent: None,
                active: true,
                materials: Vec::new(),
            },
        );
        id
    }

    pub fn node(&self, entity: EntityId) -> Option<&Node> {
        self.nodes.get(&entity)
    }

    pub fn node_mut(&mut self, entity: EntityId) -> Option<&mut Node> {
        self.nodes.get_mut(&entity)
    }

    /// Attach a material with a single `"color"` property.
    pub fn add_material(&mut self, entity: EntityId, color: Rgba) -> MaterialId {
        self.add_material_with(entity, &[("color", color)])
    }

    pub fn add_material_with(&mut self, entity: EntityId, colors: &[(&str, Rgba)]) -> MaterialId {
        let id = MaterialId(self.alloc());
        let material = Material {
            colors: colors.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        };
        self.materials.insert(id, material);
        if let Some(node) = self.nodes.get_mut(&entity) {
            node.materials.push(id);
        }
        id
    }

    /// Swap `old` on `entity` for a copy carrying its current colors, the way
    /// engines instance a shared material. Returns the new material.
    pub fn replace_material(&mut self, entity: EntityId, old: MaterialId) -> Option<MaterialId> {
        let copy = self.materials.get(&old)?.clone();
        let id = MaterialId(self.alloc());
        let node = self.nodes.get_mut(&entity)?;
        let slot = node.materials.iter_mut().find(|m| **m == old)?;
        *slot = id;
        self.materials.insert(id, copy);
        Some(id)
    }

    pub fn color(&self, material: MaterialId, property: &str) -> Option<Rgba> {
        self.materials.get(&material)?.colors.get(property).copied()
    }

    pub fn add_component(&mut self, active: bool) -> ComponentId {
        let id = ComponentId(self.alloc());
        self.components.insert(id, active);
        id
    }

    pub fn is_active(&self, target: ToggleTarget) -> Option<bool> {
        match target {
            ToggleTarget::Entity(e) => self.nodes.get(&e).map(|n| n.active),
            ToggleTarget::Component(c) | ToggleTarget::Collider(c) | ToggleTarget::Renderable(c) => {
                self.components.get(&c).copied()
            }
        }
    }

    pub fn parent(&self, entity: EntityId) -> Option<EntityId> {
        self.nodes.get(&entity).and_then(|n| n.parent)
    }

    /// Number of writes performed through [`SceneHost`].
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// World (position, rotation, scale) composed up the parent chain.
    pub fn world(&self, entity: EntityId) -> (Vec3, Quat, Vec3) {
        let Some(node) = self.nodes.get(&entity) else {
            return (ZERO, IDENTITY, ONE);
        };
        match node.parent {
            Some(parent) => {
                let (pp, pr, ps) = self.world(parent);
                (
                    add3(pp, quat_rotate(pr, mul3(ps, node.position))),
                    quat_mul(pr, node.rotation),
                    mul3(ps, node.scale),
                )
            }
            None => (node.position, node.rotation, node.scale),
        }
    }

    fn parent_world(&self, entity: EntityId) -> (Vec3, Quat, Vec3) {
        match self.parent(entity) {
            Some(p) => self.world(p),
            None => (ZERO, IDENTITY, ONE),
        }
    }

    fn is_ancestor_or_self(&self, candidate: EntityId, entity: EntityId) -> bool {
        let mut cursor = Some(entity);
        while let Some(e) = cursor {
            if e == candidate {
                return true;
            }
            cursor = self.parent(e);
        }
        false
    }
}

impl SceneHost for MemoryScene {
    fn position(&self, entity: EntityId, space: Space) -> Vec3 {
        match space {
            Space::Local => self.nodes.get(&entity).map(|n| n.position).unwrap_or(ZERO),
            Space::World => self.world(entity).0,
        }
    }

    fn set_position(&mut self, entity: EntityId, space: Space, value: Vec3) {
        let local = match space {
            Space::Local => value,
            Space::World => {
                let (pp, pr, ps) = self.parent_world(entity);
                div3(quat_rotate(quat_conjugate(pr), sub3(value, pp)), ps)
            }
        };
        if let Some(node) = self.nodes.get_mut(&entity) {
            node.position = local;
            self.writes += 1;
        }
    }

    fn rotation(&self, entity: EntityId, space: Space) -> Quat {
        match space {
            Space::Local => self.nodes.get(&entity).map(|n| n.rotation).unwrap_or(IDENTITY),
            Space::World => self.world(entity).1,
        }
    }

    fn set_rotation(&mut self, entity: EntityId, space: Space, value: Quat) {
        let local = match space {
            Space::Local => value,
            Space::World => quat_mul(quat_conjugate(self.parent_world(entity).1), value),
        };
        if let Some(node) = self.nodes.get_mut(&entity) {
            node.rotation = local;
            self.writes += 1;
        }
    }

    fn scale(&self, entity: EntityId) -> Vec3 {
        self.nodes.get(&entity).map(|n| n.scale).unwrap_or(ONE)
    }

    fn set_scale(&mut self, entity: EntityId, value: Vec3) {
        if let Some(node) = self.nodes.get_mut(&entity) {
            node.scale = value;
            self.writes += 1;
        }
    }

    fn set_parent(&mut self, entity: EntityId, parent: Option<EntityId>, keep_world: bool) {
        if !self.nodes.contains_key(&entity) {
            return;
        }
        if let Some(p) = parent {
            if !self.nodes.contains_key(&p) || self.is_ancestor_or_self(entity, p) {
                log::warn!("ignoring reparent of {entity:?} under {p:?}");
                return;
            }
        }
        let (wp, wr, ws) = self.world(entity);
        if let Some(node) = self.nodes.get_mut(&entity) {
            node.parent = parent;
        }
        if keep_world {
            let (_, _, ps) = self.parent_world(entity);
            self.set_position(entity, Space::World, wp);
            self.set_rotation(entity, Space::World, wr);
            self.set_scale(entity, div3(ws, ps));
        }
        self.writes += 1;
    }

    fn materials(&self, entity: EntityId) -> Vec<MaterialId> {
        self.nodes
            .get(&entity)
            .map(|n| n.materials.clone())
            .unwrap_or_default()
    }

    fn material_color(&self, material: MaterialId, property: &ColorProperty) -> Option<Rgba> {
        self.color(material, property.as_str())
    }

    fn set_material_color(&mut self, material: MaterialId, property: &ColorProperty, value: Rgba) {
        let slot = self
            .materials
            .get_mut(&material)
            .and_then(|m| m.colors.get_mut(property.as_str()));
        if let Some(color) = slot {
            *color = value;
            self.writes += 1;
        }
    }

    fn set_active(&mut self, target: ToggleTarget, active: bool) {
        let flag = match target {
            ToggleTarget::Entity(e) => self.nodes.get_mut(&e).map(|n| &mut n.active),
            ToggleTarget::Component(c) | ToggleTarget::Collider(c) | ToggleTarget::Renderable(c) => {
                self.components.get_mut(&c)
            }
        };
        if let Some(flag) = flag {
            *flag = active;
            self.writes += 1;
        }
    }
}

impl TargetResolver for MemoryScene {
    fn resolve(&mut self, name: &str) -> Option<EntityId> {
        self.nodes
            .iter()
            .find(|(_, n)| n.name == name)
            .map(|(id, _)| *id)
    }
}
