//! Bevy adapter for vizij-sequence-core.
//!
//! `VizijSequencePlugin` owns a `SequenceScheduler` resource and ticks it every
//! `Update` with `Time<Virtual>` as the scaled delta and `Time<Real>` for jobs
//! that ignore time scale. Jobs write straight into `Transform`, `Parent`,
//! `Visibility` and `StandardMaterial` assets through [`BevyScene`].

use bevy::prelude::*;

mod components;
mod host;
mod resources;
mod systems;

pub use components::SequenceInactive;
pub use host::{component_id, entity_id, to_entity, BevyScene};
pub use resources::{MaterialTable, SequenceEvents, SequenceScheduler};
pub use systems::{
    named_entities, register_materials_system, run_sequence_json, tick_sequences_system,
    tick_world,
};

pub struct VizijSequencePlugin;

impl Plugin for VizijSequencePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(SequenceScheduler::default())
            .insert_resource(MaterialTable::default())
            .insert_resource(SequenceEvents::default())
            .add_systems(
                Update,
                (register_materials_system, tick_sequences_system).chain(),
            );
    }
}
