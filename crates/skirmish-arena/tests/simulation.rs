use std::path::Path;

use skirmish_agent::ArchetypeConfig;
use skirmish_arena::{
    JsonModelStore, PropSpawn, RespawnConfig, SkirmishConfig, UnitSpawn, PROJECT_SCENARIO,
};
use skirmish_core::{Vec2, WorldQuery};

fn duel() -> SkirmishConfig {
    let mut config = SkirmishConfig::default();
    config.map.walls.clear();
    config.props.clear();
    config.units = vec![
        UnitSpawn::new("skirmisher", 0, Vec2::new(6.0, 12.0)),
        UnitSpawn::new("skirmisher", 1, Vec2::new(9.0, 12.0)),
    ];
    config
}

#[test]
fn same_seed_same_run() {
    let config = SkirmishConfig::default();
    let mut a = config.build().unwrap();
    let mut b = config.build().unwrap();
    let sa = a.run(Some(120)).clone();
    let sb = b.run(Some(120)).clone();
    assert_eq!(sa, sb);
    assert_eq!(sa.frames, 120);
    assert!(sa.decisions > 0);
    for (ha, hb) in a.handles().into_iter().zip(b.handles()) {
        assert_eq!(
            a.arena().agent(ha).map(|s| s.position),
            b.arena().agent(hb).map(|s| s.position)
        );
    }
}

#[test]
fn summary_counts_alive_units_per_faction() {
    let sim = SkirmishConfig::default().build().unwrap();
    let summary = sim.summary();
    assert_eq!(summary.alive_by_faction.get(&0), Some(&3));
    assert_eq!(summary.alive_by_faction.get(&1), Some(&3));
    assert_eq!(summary.frames, 0);
}

#[test]
fn units_move_during_a_run() {
    let mut sim = duel().build().unwrap();
    let start: Vec<_> = sim
        .handles()
        .iter()
        .map(|h| sim.arena().agent(*h).unwrap().position)
        .collect();
    sim.run(Some(30));
    let moved = sim
        .handles()
        .iter()
        .zip(&start)
        .filter(|(h, p)| {
            sim.arena()
                .agent(**h)
                .is_some_and(|s| s.position.distance(**p) > 0.1)
        })
        .count();
    assert!(moved > 0);
}

#[test]
fn dead_units_come_back_with_fresh_handles() {
    let mut config = duel();
    config.respawn = RespawnConfig {
        enabled: true,
        delay_ticks: 2,
    };
    let mut sim = config.build().unwrap();
    sim.step();
    let victim = sim.handles()[1];
    sim.arena_mut().damage(victim, 1000.0).unwrap();

    sim.step();
    assert_eq!(sim.summary().deaths, 1);
    assert!(!sim.squad().get(victim).unwrap().is_alive());
    for _ in 0..3 {
        sim.step();
    }
    assert_eq!(sim.summary().respawns, 1);
    let replacement = sim.handles()[1];
    assert_ne!(replacement, victim);
    assert!(sim.arena().agent(replacement).is_some());

    let agent = sim.squad().get(replacement).unwrap();
    assert!(agent.is_alive());
    assert_eq!(agent.stats().episode, 1);
}

#[test]
fn disabled_respawn_leaves_the_unit_dead() {
    let mut config = duel();
    config.respawn.enabled = false;
    let mut sim = config.build().unwrap();
    sim.step();
    let victim = sim.handles()[0];
    sim.arena_mut().damage(victim, 1000.0).unwrap();
    for _ in 0..60 {
        sim.step();
    }
    assert_eq!(sim.summary().respawns, 0);
    assert_eq!(sim.handles()[0], victim);
    assert_eq!(sim.summary().alive_by_faction.get(&0), Some(&0));
}

#[test]
fn models_survive_a_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = JsonModelStore::new(dir.path()).unwrap();
    let mut sim = SkirmishConfig::default().build().unwrap();
    sim.run(Some(20));

    let saved = sim.save_models(&mut store, Path::new("run-1"));
    // The medic plans; everyone else learns.
    assert_eq!(saved.len(), 5);
    assert!(dir.path().join("run-1/skirmisher-0.json").is_file());
    assert!(!dir.path().join("run-1/medic-2.json").exists());

    let mut other = SkirmishConfig::default().build().unwrap();
    assert_eq!(other.load_models(&store, Path::new("run-1")), 5);
    assert_eq!(other.load_models(&store, Path::new("missing")), 0);
}

#[test]
fn scenarios_load_from_yaml_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("duel.yaml");
    let yaml = r#"
seed: 11
dt: 0.05
map:
  rows:
    - "........"
    - "...#...."
    - "........"
    - "........"
archetypes:
  grunt:
    think_every_ticks: 2
  bomber:
    behavior:
      kind: exploder
      blast_damage: 80.0
units:
  - archetype: grunt
    faction: 0
    position: {x: 1.5, y: 1.5}
  - archetype: bomber
    faction: 1
    position: {x: 6.5, y: 2.5}
    health: 40.0
props:
  - kind: resource
    position: {x: 4.5, y: 3.5}
"#;
    std::fs::write(&path, yaml).unwrap();

    let config = SkirmishConfig::load(&path).unwrap();
    assert_eq!(config.seed, 11);
    assert_eq!(config.frames, SkirmishConfig::default().frames);
    assert_eq!(config.archetypes["grunt"].think_every_ticks, 2);
    assert_eq!(config.units[1].health, 40.0);
    assert!(matches!(config.props[0], PropSpawn::Resource { .. }));

    let mut sim = config.build().unwrap();
    assert_eq!(sim.arena().map().width(), 8);
    sim.run(Some(10));
    assert_eq!(sim.summary().frames, 10);
}

#[test]
fn missing_scenario_falls_back_to_default() {
    let dir = tempfile::tempdir().unwrap();
    let config = SkirmishConfig::load_or_default(&dir.path().join("absent.yaml")).unwrap();
    assert_eq!(config, SkirmishConfig::default());
}

#[test]
fn project_scenarios_live_under_the_dot_directory() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(
        SkirmishConfig::load_from_project(dir.path()).unwrap(),
        SkirmishConfig::default()
    );

    let mut config = SkirmishConfig::default();
    config.seed = 99;
    std::fs::create_dir_all(dir.path().join(".skirmish")).unwrap();
    std::fs::write(
        dir.path().join(PROJECT_SCENARIO),
        config.to_yaml().unwrap(),
    )
    .unwrap();
    assert_eq!(SkirmishConfig::load_from_project(dir.path()).unwrap().seed, 99);
}

#[test]
fn yaml_round_trip_keeps_the_scenario() {
    let config = SkirmishConfig::default();
    let text = config.to_yaml().unwrap();
    let back = SkirmishConfig::from_yaml(&text).unwrap();
    assert_eq!(back.units, config.units);
    assert_eq!(back.archetypes.len(), 3);
}

#[test]
fn invalid_archetypes_fail_the_build() {
    let mut config = duel();
    let mut broken = ArchetypeConfig::default();
    broken.rewards.min_reward = 5.0;
    broken.rewards.max_reward = -5.0;
    config.archetypes.insert("skirmisher".into(), broken);
    let err = config.build().unwrap_err();
    assert!(format!("{err:#}").contains("skirmisher"));
}

#[test]
fn bundled_duel_scenario_runs() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../scenarios/duel.yaml");
    let config = SkirmishConfig::load(&path).unwrap();
    assert_eq!(config.units.len(), 4);
    let mut sim = config.build().unwrap();
    let summary = sim.run(Some(30));
    assert_eq!(summary.frames, 30);
    assert_eq!(summary.alive_by_faction.len(), 2);
}
