use bevy::prelude::*;

/// Inserted on entities a sequence deactivated (entity, component or
/// collider toggles). Game systems can filter on `Without<SequenceInactive>`.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct SequenceInactive;
