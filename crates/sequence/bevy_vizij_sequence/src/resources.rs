use bevy::prelude::*;
use hashbrown::HashMap;
use vizij_sequence_core::{MaterialId, Scheduler, SequenceEvent};

/// The scheduler driven by `tick_sequences_system`.
#[derive(Resource, Default)]
pub struct SequenceScheduler(pub Scheduler);

/// Events raised by the most recent tick.
#[derive(Resource, Default, Clone, Debug)]
pub struct SequenceEvents(pub Vec<SequenceEvent>);

/// Stable `MaterialId`s for `StandardMaterial` assets seen on entities.
#[derive(Resource, Default, Debug)]
pub struct MaterialTable {
    ids: HashMap<AssetId<StandardMaterial>, MaterialId>,
    assets: HashMap<MaterialId, AssetId<StandardMaterial>>,
    next: u64,
}

impl MaterialTable {
    /// Id for `asset`, assigning a fresh one on first sight.
    pub fn register(&mut self, asset: AssetId<StandardMaterial>) -> MaterialId {
        if let Some(id) = self.ids.get(&asset) {
            return *id;
        }
        self.next += 1;
        let id = MaterialId(self.next);
        self.ids.insert(asset, id);
        self.assets.insert(id, asset);
        id
    }

    pub fn id_of(&self, asset: AssetId<StandardMaterial>) -> Option<MaterialId> {
        self.ids.get(&asset).copied()
    }

    pub fn asset_of(&self, id: MaterialId) -> Option<AssetId<StandardMaterial>> {
        self.assets.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
