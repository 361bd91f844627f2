mod support;

use skirmish_agent::{
    ArchetypeConfig, Exploder, Squad, Standard, TacticalAgent,
};
use skirmish_core::{ActionId, EffectKind, EffectReport, EffectRequest, TickContext, Vec2};
use skirmish_nav::NavGridCache;
use support::{h, StubCombat, StubWorld};

fn greedy() -> ArchetypeConfig {
    let mut config = ArchetypeConfig::default();
    config.policy.epsilon = 0.0;
    config.think_every_ticks = 4;
    config
}

fn ctx(tick: u64) -> TickContext {
    TickContext::new(tick, 0.1, 7)
}

#[test]
fn missing_unit_gets_the_idle_command() {
    let world = StubWorld::new();
    let mut grids = NavGridCache::new(1.0);
    let mut agent = TacticalAgent::new(h(0), greedy(), Standard, 1);

    let cmd = agent.update(&ctx(0), &world, &mut grids);
    assert!(cmd.is_idle());
    assert_eq!(cmd.motion.speed, 0.0);
    assert!(cmd.effects.is_empty());
    assert!(agent.after_action(&world, &EffectReport::default()).is_none());
}

#[test]
fn wounded_unit_retreats_from_close_enemy() {
    let world = StubWorld::new()
        .unit(0, 0, Vec2::new(10.0, 10.0), 20.0)
        .unit(1, 1, Vec2::new(11.5, 10.0), 100.0);
    let mut grids = NavGridCache::new(1.0);
    let mut agent = TacticalAgent::new(h(0), greedy(), Standard, 1);

    let cmd = agent.update(&ctx(0), &world, &mut grids);
    assert_eq!(cmd.action, Some(ActionId::Retreat));
    assert!(cmd.thought);
    assert!(agent.path().is_none(), "fleeing does not plan a path");
}

#[test]
fn decisions_follow_the_think_cadence() {
    let world = StubWorld::new()
        .unit(0, 0, Vec2::new(10.0, 10.0), 100.0)
        .unit(1, 1, Vec2::new(15.0, 10.0), 100.0);
    let mut grids = NavGridCache::new(1.0);
    let mut agent = TacticalAgent::new(h(0), greedy(), Standard, 1);

    let thoughts: Vec<bool> = (0..8)
        .map(|t| agent.update(&ctx(t), &world, &mut grids).thought)
        .collect();
    assert_eq!(
        thoughts,
        vec![true, false, false, false, true, false, false, false]
    );
    assert_eq!(agent.stats().decisions, 2);
}

#[test]
fn approach_plans_a_path_around_a_wall() {
    let world = StubWorld::new()
        .unit(0, 0, Vec2::new(10.0, 10.0), 100.0)
        .unit(1, 1, Vec2::new(16.0, 10.0), 100.0)
        .wall(Vec2::new(12.0, 0.0), Vec2::new(13.0, 18.0));
    let mut grids = NavGridCache::new(1.0);
    let mut agent = TacticalAgent::new(h(0), greedy(), Standard, 1);

    let cmd = agent.update(&ctx(0), &world, &mut grids);
    assert_eq!(cmd.action, Some(ActionId::Approach));
    let path = agent.path().expect("path planned");
    assert!(path.len() >= 2, "detour needs intermediate waypoints");
    assert!(path.waypoints().any(|wp| wp.y > 18.0), "route passes the wall's open end");
    assert!(grids.builds() >= 1);
}

#[test]
fn one_experience_per_decision() {
    let world = StubWorld::new()
        .unit(0, 0, Vec2::new(10.0, 10.0), 100.0)
        .unit(1, 1, Vec2::new(15.0, 10.0), 100.0);
    let mut grids = NavGridCache::new(1.0);
    let mut agent = TacticalAgent::new(h(0), greedy(), Standard, 1);

    let mut rewards = Vec::new();
    for t in 0..9 {
        agent.update(&ctx(t), &world, &mut grids);
        let outcome = agent.after_action(&world, &EffectReport::default()).unwrap();
        assert!(!outcome.terminal);
        rewards.push(outcome.reward.total);
    }
    assert_eq!(agent.stats().steps, 9);
    assert_eq!(agent.stats().decisions, 3);

    // Decisions at ticks 0, 4 and 8; the third window is still open.
    let policy = agent.policy().unwrap();
    assert_eq!(policy.buffer().len(), 2);
    let first = policy.buffer().iter().next().unwrap();
    let window: f32 = rewards[0..4].iter().sum();
    assert!((first.reward - window).abs() < 1e-4);
    assert!(!first.terminal);
}

#[test]
fn death_ends_the_episode_and_respawn_starts_another() {
    let mut world = StubWorld::new()
        .unit(0, 0, Vec2::new(10.0, 10.0), 100.0)
        .unit(1, 1, Vec2::new(15.0, 10.0), 100.0);
    let mut grids = NavGridCache::new(1.0);
    let mut config = greedy();
    config.policy.epsilon = 0.5;
    let mut agent = TacticalAgent::new(h(0), config, Standard, 1);

    agent.update(&ctx(0), &world, &mut grids);
    world.get_mut(h(0)).unwrap().health = 0.0;
    let outcome = agent.after_action(&world, &EffectReport::default()).unwrap();

    assert!(outcome.terminal);
    assert!(outcome.reward.death < 0.0);
    assert!(!agent.is_alive());
    assert_eq!(agent.last_episode().unwrap().episode, 0);
    let policy = agent.policy().unwrap();
    assert_eq!(policy.episodes(), 1);
    assert!(policy.epsilon() < 0.5);
    assert!(policy.buffer().iter().last().unwrap().terminal);

    assert!(agent.update(&ctx(1), &world, &mut grids).is_idle());

    world.get_mut(h(0)).unwrap().health = 100.0;
    agent.respawn(h(0));
    assert!(agent.is_alive());
    assert_eq!(agent.stats().episode, 1);
    assert!(!agent.update(&ctx(2), &world, &mut grids).is_idle());
}

#[test]
fn unit_removed_between_frames_still_ends_its_episode() {
    let mut world = StubWorld::new()
        .unit(0, 0, Vec2::new(10.0, 10.0), 100.0)
        .unit(1, 1, Vec2::new(15.0, 10.0), 100.0);
    let mut grids = NavGridCache::new(1.0);
    let mut agent = TacticalAgent::new(h(0), greedy(), Standard, 1);

    agent.update(&ctx(0), &world, &mut grids);
    assert!(!agent
        .after_action(&world, &EffectReport::default())
        .unwrap()
        .terminal);

    world.remove(h(0));
    assert!(agent.update(&ctx(1), &world, &mut grids).is_idle());
    let outcome = agent.after_action(&world, &EffectReport::default()).unwrap();
    assert!(outcome.terminal);
    assert!(!agent.is_alive());
    assert!(agent.after_action(&world, &EffectReport::default()).is_none());
}

#[test]
fn exploder_detonates_once_on_contact() {
    let world = StubWorld::new()
        .unit(0, 0, Vec2::new(10.0, 10.0), 100.0)
        .unit(1, 1, Vec2::new(11.0, 10.0), 100.0);
    let mut grids = NavGridCache::new(1.0);
    let exploder = Exploder::new(1.2, 3.0, 60.0);
    let mut agent = TacticalAgent::new(h(0), ArchetypeConfig::exploder(), exploder, 1);

    let cmd = agent.update(&ctx(1), &world, &mut grids);
    let blasts = cmd
        .effects
        .iter()
        .filter(|e| matches!(e.kind, EffectKind::Explode { .. }))
        .count();
    assert_eq!(blasts, 1);
    assert!(agent.behavior().has_detonated());

    let again = agent.update(&ctx(2), &world, &mut grids);
    assert!(again
        .effects
        .iter()
        .all(|e| !matches!(e.kind, EffectKind::Explode { .. })));
}

#[test]
fn support_unit_heals_wounded_ally_in_range() {
    let world = StubWorld::new()
        .unit(0, 0, Vec2::new(10.0, 10.0), 100.0)
        .unit(1, 0, Vec2::new(12.0, 10.0), 40.0);
    let mut grids = NavGridCache::new(1.0);
    let mut agent = TacticalAgent::new(h(0), ArchetypeConfig::support(), Standard, 1);
    assert!(agent.policy().is_none());

    let cmd = agent.update(&ctx(0), &world, &mut grids);
    assert_eq!(cmd.action, Some(ActionId::HealAlly));
    assert!(cmd
        .effects
        .contains(&EffectRequest::on(EffectKind::Heal { slot: 0 }, h(1))));
}

#[test]
fn squad_step_moves_units_and_resolves_effects() {
    let mut world = StubWorld::new()
        .unit(0, 0, Vec2::new(4.0, 10.0), 100.0)
        .unit(1, 1, Vec2::new(14.0, 10.0), 100.0);
    let mut combat = StubCombat::default();
    let mut squad: Squad = Squad::new(1.0);
    for i in 0..2 {
        squad.push(TacticalAgent::new(
            h(i),
            greedy(),
            skirmish_agent::behavior_for(&Default::default()),
            3,
        ));
    }

    let start = world.get(h(0)).unwrap().position;
    let mut decisions = 0;
    let mut t = ctx(0);
    for _ in 0..10 {
        let report = squad.step(&t, &mut world, &mut combat);
        assert_eq!(report.tick, t.tick);
        decisions += report.decisions;
        t = t.next();
    }
    assert!(decisions >= 2);
    let moved = world.get(h(0)).unwrap().position.distance(start);
    assert!(moved > 0.1, "unit advanced toward the enemy (moved {moved})");
}

#[test]
fn one_missing_unit_does_not_stop_the_frame() {
    let mut world = StubWorld::new()
        .unit(0, 0, Vec2::new(4.0, 10.0), 100.0)
        .unit(1, 1, Vec2::new(14.0, 10.0), 100.0);
    let mut combat = StubCombat::default();
    let mut squad: Squad<Standard> = Squad::new(1.0);
    for i in [0, 1, 9] {
        squad.push(TacticalAgent::new(h(i), greedy(), Standard, 3));
    }

    let report = squad.step(&ctx(0), &mut world, &mut combat);
    assert_eq!(report.active, 2);
    assert_eq!(report.decisions, 2);
}

#[test]
fn exploder_death_is_reported_by_the_squad() {
    let mut world = StubWorld::new()
        .unit(0, 0, Vec2::new(10.0, 10.0), 100.0)
        .unit(1, 1, Vec2::new(11.0, 10.0), 50.0);
    let mut combat = StubCombat::default();
    let mut squad: Squad = Squad::new(1.0);
    squad.push(TacticalAgent::new(
        h(0),
        ArchetypeConfig::exploder(),
        skirmish_agent::behavior_for(&ArchetypeConfig::exploder().behavior),
        3,
    ));

    let report = squad.step(&ctx(0), &mut world, &mut combat);
    assert_eq!(report.deaths, vec![h(0)]);
    assert_eq!(report.kills, 1);
    assert!(world.get(h(0)).is_none());
    assert!(!squad.get(h(0)).unwrap().is_alive());
}
