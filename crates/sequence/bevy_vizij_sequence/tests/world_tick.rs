use bevy::prelude::*;
use bevy_vizij_sequence::{
    component_id, entity_id, register_materials_system, run_sequence_json, tick_world,
    SequenceInactive, SequenceScheduler,
};
use vizij_sequence_core::{Frame, Overrides, RunOptions, Scheduler, ToggleTarget};

fn approx_vec3(a: Vec3, b: Vec3) {
    assert!((a - b).length() <= 1e-4, "left={a:?} right={b:?}");
}

fn step(world: &mut World, dt: f32) {
    world.resource_scope(|world, mut scheduler: Mut<SequenceScheduler>| {
        tick_world(&mut scheduler.0, world, Frame::scaled(dt));
    });
}

/// it should move, rotate and scale Transforms directly
#[test]
fn transforms_are_driven() {
    let mut world = World::new();
    let e = world.spawn(Transform::from_xyz(1.0, 0.0, 0.0)).id();
    let mut scheduler = Scheduler::default();

    let mut comp = scheduler.compose();
    comp.begin(entity_id(e))
        .move_to([3.0, 0.0, 0.0])
        .flush()
        .scale_to_with([2.0, 2.0, 2.0], Overrides::new().duration(0.5))
        .rotate_to_euler([0.0, 90.0, 0.0]);
    let handle = scheduler.run(&mut comp, RunOptions::new());

    tick_world(&mut scheduler, &mut world, Frame::scaled(0.5));
    approx_vec3(world.get::<Transform>(e).unwrap().translation, Vec3::new(2.0, 0.0, 0.0));

    for _ in 0..6 {
        tick_world(&mut scheduler, &mut world, Frame::scaled(0.5));
    }
    assert!(handle.is_finished());
    let tf = world.get::<Transform>(e).unwrap();
    approx_vec3(tf.translation, Vec3::new(3.0, 0.0, 0.0));
    approx_vec3(tf.scale, Vec3::splat(2.0));
    let expected = Quat::from_rotation_y(90f32.to_radians());
    assert!(tf.rotation.angle_between(expected) < 1e-3);
}

/// it should reparent through the Bevy hierarchy, keeping world pose on request
#[test]
fn reparent_keeps_world_pose() {
    let mut world = World::new();
    let pivot = world.spawn(Transform::from_xyz(0.0, 5.0, 0.0)).id();
    let e = world.spawn(Transform::from_xyz(1.0, 1.0, 0.0)).id();
    let mut scheduler = Scheduler::default();

    let mut comp = scheduler.compose();
    comp.begin(entity_id(e))
        .reparent_with(Some(entity_id(pivot)), true);
    scheduler.run(&mut comp, RunOptions::new());
    tick_world(&mut scheduler, &mut world, Frame::scaled(0.0));

    assert_eq!(world.get::<Parent>(e).map(|p| p.get()), Some(pivot));
    approx_vec3(
        world.get::<Transform>(e).unwrap().translation,
        Vec3::new(1.0, -4.0, 0.0),
    );
}

/// it should fade StandardMaterial base color and emissive
#[test]
fn materials_fade() {
    let mut world = World::new();
    let mut assets = Assets::<StandardMaterial>::default();
    let handle = assets.add(StandardMaterial {
        base_color: Color::srgba(1.0, 1.0, 1.0, 1.0),
        emissive: LinearRgba::new(1.0, 0.0, 0.0, 1.0),
        ..default()
    });
    world.insert_resource(assets);
    let e = world.spawn((Transform::default(), handle.clone())).id();
    register_materials_system(&mut world);

    let mut scheduler = Scheduler::default();
    let mut comp = scheduler.compose();
    {
        let scene = bevy_vizij_sequence::BevyScene::new(&mut world);
        comp.begin(entity_id(e))
            .fade_alpha(&scene, 0.0)
            .fade_color_with(
                &scene,
                [0.0, 0.0, 0.0, 1.0],
                Overrides::new().color_property("emissive").duration(0.5),
            );
    }
    let job = scheduler.run(&mut comp, RunOptions::new());

    tick_world(&mut scheduler, &mut world, Frame::scaled(0.5));
    let mat = world
        .resource::<Assets<StandardMaterial>>()
        .get(&handle)
        .unwrap();
    assert!((mat.base_color.alpha() - 0.5).abs() <= 1e-5);

    tick_world(&mut scheduler, &mut world, Frame::scaled(0.5));
    tick_world(&mut scheduler, &mut world, Frame::scaled(0.5));
    assert!(job.is_finished());
    let mat = world
        .resource::<Assets<StandardMaterial>>()
        .get(&handle)
        .unwrap();
    assert!(mat.base_color.alpha().abs() <= 1e-5);
    assert_eq!(mat.emissive, LinearRgba::new(0.0, 0.0, 0.0, 1.0));
}

/// it should hide entities and mark deactivated components
#[test]
fn toggles_map_to_visibility_and_marker() {
    let mut world = World::new();
    let e = world.spawn((Transform::default(), Visibility::Visible)).id();
    let other = world.spawn(Transform::default()).id();
    let mut scheduler = Scheduler::default();

    let mut comp = scheduler.compose();
    comp.begin(entity_id(e))
        .set_active(ToggleTarget::Entity(entity_id(e)), false)
        .set_active(ToggleTarget::Collider(component_id(other)), false);
    scheduler.run(&mut comp, RunOptions::new());
    tick_world(&mut scheduler, &mut world, Frame::scaled(0.1));

    assert_eq!(world.get::<Visibility>(e), Some(&Visibility::Hidden));
    assert!(world.get::<SequenceInactive>(e).is_some());
    assert!(world.get::<SequenceInactive>(other).is_some());
    assert!(world.get::<Visibility>(other).is_none());
}

/// it should play the pivot hand-off fixture against named entities
#[test]
fn fixture_runs_on_world() {
    let mut world = World::new();
    let cube = world.spawn((Name::new("cube"), Transform::default())).id();
    let pivot = world
        .spawn((Name::new("pivot"), Transform::from_xyz(0.0, 2.0, 0.0)))
        .id();

    let json = vizij_test_fixtures::sequences::json("pivot-handoff").unwrap();
    let handle = run_sequence_json(&mut world, &json).unwrap();
    for _ in 0..4 {
        step(&mut world, 1.0);
    }
    assert!(handle.is_finished());
    assert_eq!(world.get::<Parent>(cube).map(|p| p.get()), Some(pivot));
    approx_vec3(
        world.get::<Transform>(cube).unwrap().translation,
        Vec3::new(1.0, 0.0, 0.0),
    );
}

/// it should report unknown names as errors
#[test]
fn unknown_target_is_rejected() {
    let mut world = World::new();
    let json = r#"{ "programs": [ { "target": "nobody" } ] }"#;
    assert!(run_sequence_json(&mut world, json).is_err());
}
