#![cfg(feature = "full")]

use skirmish::arena::SkirmishConfig;
use skirmish::core::{ActionId, Vec2};
use skirmish::nav::{find_path, NavGrid, SearchLimits};

#[test]
fn umbrella_paths_reach_every_component() {
    let grid = NavGrid::new(4, 4, 1.0);
    let result = find_path(
        &grid,
        Vec2::new(0.5, 0.5),
        Vec2::new(3.5, 3.5),
        SearchLimits::default(),
    );
    assert!(result.outcome.is_found());

    let mut sim = SkirmishConfig::default().build().unwrap();
    sim.run(Some(5));
    assert_eq!(sim.summary().frames, 5);
}

#[cfg(feature = "serde")]
#[test]
fn action_ids_serialize_in_snake_case() {
    let text = serde_json::to_string(&ActionId::UseAbility).unwrap();
    assert_eq!(text, "\"use_ability\"");
}

#[test]
fn action_names_are_stable() {
    assert_eq!(ActionId::HealAlly.name(), "heal_ally");
}
