//! A squad forms from nearby spawns, loses its leader, and promotes a successor.

use bevy::prelude::*;
use horde_survival::gameplay::ai::{AiTuning, EnemyBrain};
use horde_survival::gameplay::enemies::spawn::WaveSpawner;
use horde_survival::gameplay::enemies::{Enemy, EnemyKind, EnemySpawned, spawn_enemy};
use horde_survival::gameplay::groups::{EnemyGroupManager, GroupConfig, Role, Squad};
use horde_survival::gameplay::{Body, Health};
use pretty_assertions::assert_eq;

use super::{create_game_app, enter_game};

fn create_squad_app() -> App {
    let mut app = create_game_app();
    app.insert_resource(GroupConfig {
        new_group_chance: 1.0,
        ..default()
    });
    enter_game(&mut app);
    // Keep waves out of the way.
    app.insert_resource(WaveSpawner {
        timer: Timer::from_seconds(1000.0, TimerMode::Once),
        ..default()
    });
    app
}

fn spawn_grunt(app: &mut App, center: Vec2) -> Entity {
    let tuning = app.world().resource::<AiTuning>().clone();
    let entity = {
        let mut commands = app.world_mut().commands();
        spawn_enemy(&mut commands, EnemyKind::Grunt, 1, center, &tuning)
    };
    app.world_mut().flush();
    app.world_mut()
        .resource_mut::<Messages<EnemySpawned>>()
        .write(EnemySpawned { entity, center });
    entity
}

fn squads(app: &mut App) -> Vec<(Entity, Squad)> {
    app.world_mut()
        .query::<(Entity, &Squad)>()
        .iter(app.world())
        .map(|(entity, squad)| (entity, *squad))
        .collect()
}

#[test]
fn nearby_spawns_form_one_led_squad() {
    let mut app = create_squad_app();
    let grunts: Vec<Entity> = [100.0, 130.0, 160.0]
        .into_iter()
        .map(|x| spawn_grunt(&mut app, Vec2::new(x, 100.0)))
        .collect();

    app.update();
    app.update();

    let squads = squads(&mut app);
    assert_eq!(squads.len(), 3);
    let group = squads[0].1.group;
    assert!(squads.iter().all(|(_, squad)| squad.group == group));
    let leaders = squads.iter().filter(|(_, s)| s.role == Role::Leader).count();
    assert_eq!(leaders, 1);

    let manager = app.world().resource::<EnemyGroupManager>();
    for grunt in &grunts {
        assert_eq!(manager.group_of(*grunt).map(|g| g.id()), Some(group));
    }
}

#[test]
fn slain_leader_is_replaced_by_earliest_member() {
    let mut app = create_squad_app();
    let first = spawn_grunt(&mut app, Vec2::new(100.0, 100.0));
    app.update();
    let second = spawn_grunt(&mut app, Vec2::new(130.0, 100.0));
    app.update();
    let third = spawn_grunt(&mut app, Vec2::new(160.0, 100.0));
    app.update();

    let leader = app
        .world()
        .resource::<EnemyGroupManager>()
        .group_of(first)
        .and_then(|g| g.leader());
    assert_eq!(leader, Some(first));

    app.world_mut().entity_mut(first).insert(Health {
        current: 0.0,
        max: 30.0,
    });
    app.update();
    app.update();

    assert!(app.world().get_entity(first).is_err());
    let manager = app.world().resource::<EnemyGroupManager>();
    assert!(manager.group_of(first).is_none());
    let group = manager.group_of(second);
    assert_eq!(group.and_then(|g| g.leader()), Some(second));
    assert!(group.is_some_and(|g| g.contains(third) && g.len() == 2));
    let role = app.world().get::<Squad>(second).map(|s| s.role);
    assert_eq!(role, Some(Role::Leader));
}

#[test]
fn enemies_chase_the_player_while_playing() {
    let mut app = create_squad_app();
    let grunt = spawn_grunt(&mut app, Vec2::new(100.0, 360.0));

    for _ in 0..5 {
        app.update();
    }

    let world = app.world();
    let state = world.get::<EnemyBrain>(grunt).map(EnemyBrain::state_name);
    assert_eq!(state, Some("Pursue"));
    let x = world.get::<Body>(grunt).map_or(0.0, |b| b.center().x);
    assert!(x > 100.0, "grunt should advance, x = {x}");
    assert!(world.get::<Enemy>(grunt).is_some());
}
