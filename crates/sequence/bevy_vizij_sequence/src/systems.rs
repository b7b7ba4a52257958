use bevy::prelude::*;
use hashbrown::HashMap;
use vizij_sequence_core::{
    parse_sequence_json, EntityId, Frame, JobHandle, Outputs, Scheduler, SequenceError,
};

use crate::host::{entity_id, BevyScene};
use crate::resources::{MaterialTable, SequenceEvents, SequenceScheduler};

/// Assign ids to every `StandardMaterial` handle currently on an entity, so
/// fades can list them (including instances swapped in mid-fade).
pub fn register_materials_system(world: &mut World) {
    let mut handles = world.query::<&Handle<StandardMaterial>>();
    let seen: Vec<AssetId<StandardMaterial>> = handles.iter(world).map(|h| h.id()).collect();
    let mut table = world.get_resource_or_insert_with(MaterialTable::default);
    for asset in seen {
        table.register(asset);
    }
}

/// Advance `scheduler` one frame against `world`.
pub fn tick_world(scheduler: &mut Scheduler, world: &mut World, frame: Frame) -> Outputs {
    let mut scene = BevyScene::new(world);
    scheduler.tick(frame, &mut scene).clone()
}

/// Exclusive: reads virtual (scaled) and real deltas, ticks every job and
/// publishes the tick's events into `SequenceEvents`.
pub fn tick_sequences_system(world: &mut World) {
    let scaled = world
        .get_resource::<Time<Virtual>>()
        .map(|t| t.delta_seconds())
        .unwrap_or(0.0);
    let frame = match world.get_resource::<Time<Real>>() {
        Some(real) => Frame::new(scaled, real.delta_seconds()),
        None => Frame::scaled(scaled),
    };

    if !world.contains_resource::<SequenceScheduler>() {
        return;
    }
    world.resource_scope(|world, mut scheduler: Mut<SequenceScheduler>| {
        let out = tick_world(&mut scheduler.0, world, frame);
        if out.dropped_events > 0 {
            warn!("dropped {} sequence events this frame", out.dropped_events);
        }
        let mut events = world.get_resource_or_insert_with(SequenceEvents::default);
        events.0 = out.events;
    });
}

/// Name -> entity lookup over every entity carrying a `Name`.
pub fn named_entities(world: &mut World) -> HashMap<String, EntityId> {
    let mut q = world.query::<(Entity, &Name)>();
    q.iter(world)
        .map(|(e, name)| (name.as_str().to_string(), entity_id(e)))
        .collect()
}

/// Parse a stored sequence, resolve its targets by `Name` and launch it on
/// the world's `SequenceScheduler`.
pub fn run_sequence_json(world: &mut World, json: &str) -> Result<JobHandle, SequenceError> {
    let doc = parse_sequence_json(json)?;
    world.init_resource::<SequenceScheduler>();
    register_materials_system(world);
    let mut names = named_entities(world);
    world.resource_scope(|world, mut scheduler: Mut<SequenceScheduler>| {
        let scene = BevyScene::new(world);
        let (mut comp, options) =
            doc.compose_with_config(scheduler.0.config(), &mut names, &scene)?;
        Ok(scheduler.0.run(&mut comp, options))
    })
}
