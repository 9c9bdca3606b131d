use glam::Vec3;
use proptest::prelude::*;

use fathom_pawn::{Body, PawnEvent};
use fathom_sim::{Session, SessionConfig};
use fathom_weapons::{ProjectileKind, WeaponEvent};

const DT: f32 = 1.0 / 30.0;

fn lossless() -> Session {
    Session::new(SessionConfig::default())
}

#[test]
fn owner_movement_replicates_to_the_observer() {
    let mut session = lossless();
    for _ in 0..30 {
        session.move_input(Vec3::X);
        session.tick(DT);
    }
    let owner_pos = session.owner.pawn.body.position();
    let observer_pos = session.observer.pawn.body.position();
    assert!(owner_pos.x > 10.0, "owner should have moved");
    // Same-tick delivery: the observer differs only by wire quantization.
    assert!((owner_pos - observer_pos).length() < 0.1);
    assert!((session.owner.pawn.body.velocity() - session.observer.pawn.body.velocity()).length() < 0.1);
}

#[test]
fn observer_freezes_under_total_packet_loss() {
    let cfg = SessionConfig {
        unreliable_loss: 1.0,
        ..SessionConfig::default()
    };
    let mut session = Session::new(cfg);
    for _ in 0..30 {
        session.move_input(Vec3::X);
        session.tick(DT);
    }
    assert!(session.owner.pawn.body.position().x > 10.0);
    // Every movement update was dropped; the observer never saw one.
    assert_eq!(session.observer.pawn.body.position(), Vec3::ZERO);
    assert!(session.observer.pawn.channel.last_timestamp_applied() < 0.0);
}

#[test]
fn reliable_traffic_survives_total_unreliable_loss() {
    let cfg = SessionConfig {
        unreliable_loss: 1.0,
        ..SessionConfig::default()
    };
    let mut session = Session::new(cfg);
    session.trigger_input(true);
    for _ in 0..6 {
        session.tick(DT);
    }
    // The trigger press rode the reliable channel: the authority fires
    // canonical projectiles and the observer sees the firing flag.
    assert!(!session.authority.sink.spawned.is_empty());
    assert!(session
        .observer
        .weapon_events
        .contains(&WeaponEvent::StartedShooting));
}

#[test]
fn trigger_round_trip_spawns_matching_projectiles() {
    let mut session = lossless();
    session.trigger_input(true);
    for _ in 0..8 {
        session.tick(0.12);
    }
    session.trigger_input(false);

    let owner_shots = &session.owner.sink.spawned;
    let authority_shots = &session.authority.sink.spawned;
    // Shot-for-shot parity: both sides anchor on the same timestamps.
    assert_eq!(owner_shots.len(), 10);
    assert_eq!(authority_shots.len(), 10);
    assert!(owner_shots
        .iter()
        .all(|s| s.kind == ProjectileKind::Cosmetic && s.lifespan == Some(0.2)));
    assert!(authority_shots.iter().all(|s| s.kind == ProjectileKind::Canonical));
    // Each canonical projectile is torn off at the following shot.
    let torn: Vec<bool> = authority_shots.iter().map(|s| s.torn_off).collect();
    assert_eq!(&torn[..9], &[true; 9]);
    assert!(!torn[9]);

    // The observer derives its own cadence and spawns nothing.
    assert!(session.observer.sink.spawned.is_empty());
    let observer_shots = session
        .observer
        .weapon_events
        .iter()
        .filter(|e| **e == WeaponEvent::ShotFired)
        .count();
    assert!(observer_shots > 0);
}

#[test]
fn stop_shooting_propagates_to_everyone() {
    let mut session = lossless();
    session.trigger_input(true);
    session.run(6);
    session.trigger_input(false);
    session.run(2);

    assert!(!session.owner.weapon.is_shooting());
    assert!(!session.authority.weapon.is_shooting());
    assert!(!session.observer.weapon.is_shooting());
    assert!(session
        .observer
        .weapon_events
        .contains(&WeaponEvent::StoppedShooting));

    // Nothing fires after the stop settles.
    let authority_count = session.authority.sink.spawned.len();
    session.run(30);
    assert_eq!(session.authority.sink.spawned.len(), authority_count);
}

#[test]
fn dash_velocity_replicates_to_the_observer() {
    let mut session = lossless();
    // Dash availability starts on cooldown; run past the 2s window first.
    session.run(70);
    session.move_input(Vec3::X);
    session.tick(DT);
    session.dash_input(true);
    assert!(session.owner.pawn_events.contains(&PawnEvent::DashStarted));

    session.tick(DT);
    assert!(session.owner.pawn.body.velocity().length() > 2000.0);
    assert!(session.observer.pawn.body.velocity().length() > 2000.0);
}

#[test]
fn juggernaut_charge_dash_runs_through_the_session() {
    let mut cfg = SessionConfig::default();
    cfg.custom
        .insert("juggernaut".into(), serde_json::Value::Bool(true));
    let mut session = Session::new(cfg);
    session.promote_juggernaut();
    // Run past the 4s juggernaut cooldown window.
    session.run(130);

    // Hold the charge past the lock-in window, then release.
    session.dash_input(true);
    assert!(session.owner.pawn.dash().is_charging());
    session.run(36); // 1.2s at 30Hz: 60% of the 2s charge
    session.dash_input(false);
    assert!(session.owner.pawn_events.contains(&PawnEvent::DashStarted));
    assert!(session.owner.pawn.dash().is_dashing());
    assert!(session.owner.pawn.body.velocity().length() > 3000.0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Under arbitrary tick jitter the owner and authority fire the same
    // number of shots: both anchor every timestamp on the same press.
    #[test]
    fn cadence_parity_under_tick_jitter(dts in prop::collection::vec(0.02f32..0.15, 5..40)) {
        let mut session = lossless();
        session.trigger_input(true);
        for dt in dts {
            session.tick(dt);
        }
        prop_assert_eq!(
            session.owner.sink.spawned.len(),
            session.authority.sink.spawned.len()
        );
        prop_assert!((session.owner.weapon.time_last_fired()
            - session.authority.weapon.time_last_fired()).abs() < 1e-3);
    }
}
