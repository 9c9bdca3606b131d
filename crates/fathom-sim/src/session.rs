use glam::Vec3;
use smallvec::SmallVec;

use fathom_core::clock::{Clock, ManualClock};
use fathom_core::net::messages::{
    Channel, ClientMessage, JuggernautStateMsg, ServerMessage, ShootingStateMsg,
};
use fathom_core::net::protocol::{
    decode_client_message, decode_server_message, encode_client_message, encode_server_message,
};
use fathom_core::role::ReplicationContext;
use fathom_pawn::{Body, MovementEffect, Pawn, PawnConfig, PawnEvent, Rotator};
use fathom_weapons::{
    FireTransform, RecordingSink, WeaponCadence, WeaponConfig, WeaponEffect, WeaponEvent,
};

use crate::config::SessionConfig;
use crate::link::Link;

/// One replicated view of the controlled actor: its pawn, its weapon, the
/// projectiles it spawned, and every event it surfaced.
pub struct ActorInstance {
    pub pawn: Pawn,
    pub weapon: WeaponCadence,
    pub sink: RecordingSink,
    pub pawn_events: Vec<PawnEvent>,
    pub weapon_events: Vec<WeaponEvent>,
}

impl ActorInstance {
    fn new(ctx: ReplicationContext, pawn_cfg: PawnConfig, weapon_cfg: &WeaponConfig, now: f32) -> Self {
        Self {
            pawn: Pawn::new(ctx, pawn_cfg, now),
            weapon: WeaponCadence::new(ctx, weapon_cfg, now),
            sink: RecordingSink::new(),
            pawn_events: Vec::new(),
            weapon_events: Vec::new(),
        }
    }

    fn fire_transform(&self) -> FireTransform {
        FireTransform::new(
            self.pawn.body.position(),
            self.pawn.body.orientation(),
            self.pawn.body.velocity(),
        )
    }

    fn absorb_pawn_events(&mut self, now: f32, events: impl IntoIterator<Item = PawnEvent>) {
        for event in events {
            if event == PawnEvent::BecameJuggernaut {
                // Juggernauts trade their standard weapons for the ram dash.
                self.weapon.set_enabled(now, false);
            }
            self.pawn_events.push(event);
        }
    }
}

/// One controlled actor replicated across three instances on a shared
/// manual clock: the owning client, a dedicated-server authority, and a
/// remote observer. `tick` advances everything in lockstep, routing encoded
/// frames over in-memory links with zero latency: effects raised during a
/// tick flow downstream within that same tick, and input effects raised
/// between ticks are ingested on the following one.
pub struct Session {
    cfg: SessionConfig,
    clock: ManualClock,
    pub owner: ActorInstance,
    pub authority: ActorInstance,
    pub observer: ActorInstance,
    to_authority_unreliable: Link,
    to_authority_reliable: Link,
    to_observer_unreliable: Link,
    to_observer_reliable: Link,
    last_shooting_flag: bool,
}

impl Session {
    pub fn new(cfg: SessionConfig) -> Self {
        Self::with_configs(cfg, PawnConfig::default(), WeaponConfig::default())
    }

    pub fn with_configs(cfg: SessionConfig, pawn_cfg: PawnConfig, weapon_cfg: WeaponConfig) -> Self {
        let clock = ManualClock::new(0.0);
        let now = clock.now();
        Self {
            owner: ActorInstance::new(ReplicationContext::autonomous(), pawn_cfg, &weapon_cfg, now),
            authority: ActorInstance::new(
                ReplicationContext::authority(false),
                pawn_cfg,
                &weapon_cfg,
                now,
            ),
            observer: ActorInstance::new(ReplicationContext::simulated(), pawn_cfg, &weapon_cfg, now),
            to_authority_unreliable: Link::unreliable(cfg.unreliable_loss, cfg.seed),
            to_authority_reliable: Link::reliable(),
            to_observer_unreliable: Link::unreliable(cfg.unreliable_loss, cfg.seed.wrapping_add(1)),
            to_observer_reliable: Link::reliable(),
            last_shooting_flag: false,
            clock,
            cfg,
        }
    }

    pub fn now(&self) -> f32 {
        self.clock.now()
    }

    /// Strafe input on the owning client, consumed by the next tick.
    pub fn move_input(&mut self, direction: Vec3) {
        self.owner.pawn.move_input(direction);
    }

    pub fn rotate_input(&mut self, dt: f32, input: Rotator) {
        let now = self.now();
        self.owner.pawn.rotate_input(now, dt, input);
    }

    pub fn dash_input(&mut self, pressed: bool) {
        let now = self.now();
        let events = self.owner.pawn.dash_input(now, pressed);
        self.owner.absorb_pawn_events(now, events);
    }

    pub fn trigger_input(&mut self, pressed: bool) {
        let now = self.now();
        let current = self.owner.fire_transform();
        let (effects, events) =
            self.owner
                .weapon
                .handle_trigger(now, pressed, &current, &mut self.owner.sink);
        self.owner.weapon_events.extend(events);
        self.route_weapon_effects(effects);
    }

    /// Server-side pickup grants juggernaut status. The observer learns of
    /// it over the reliable link; the owner's return channel is not modeled
    /// here, so the flag is applied to it directly.
    pub fn promote_juggernaut(&mut self) {
        if !self.cfg.juggernaut_enabled() {
            tracing::warn!("juggernaut variant disabled in session config; promotion ignored");
            return;
        }
        let now = self.now();
        let events = self.authority.pawn.set_juggernaut();
        self.authority.absorb_pawn_events(now, events);
        let events = self.owner.pawn.set_juggernaut();
        self.owner.absorb_pawn_events(now, events);
        self.send_server_message(&ServerMessage::JuggernautState(JuggernautStateMsg {
            is_juggernaut: true,
        }));
    }

    /// One lockstep step: owner predicts and reports, authority ingests and
    /// re-publishes, observer ingests and presents.
    pub fn tick(&mut self, dt: f32) {
        self.clock.advance(dt);
        let now = self.clock.now();

        let (effects, events) = self.owner.pawn.tick(now, dt);
        self.owner.absorb_pawn_events(now, events);
        for effect in effects {
            let MovementEffect::SendTransform(msg) = effect;
            self.send_client_message(&ClientMessage::SetTransform(msg));
        }
        let current = self.owner.fire_transform();
        let events = self.owner.weapon.tick(now, &current, &mut self.owner.sink);
        self.owner.weapon_events.extend(events);

        self.deliver_to_authority(now);
        let (_, events) = self.authority.pawn.tick(now, dt);
        self.authority.absorb_pawn_events(now, events);
        let current = self.authority.fire_transform();
        let events = self
            .authority
            .weapon
            .tick(now, &current, &mut self.authority.sink);
        self.authority.weapon_events.extend(events);

        let snapshot = *self.authority.pawn.channel.snapshot();
        self.send_server_message(&ServerMessage::MovementUpdate(snapshot));
        let flag = self.authority.weapon.is_shooting();
        if flag != self.last_shooting_flag {
            self.last_shooting_flag = flag;
            self.send_server_message(&ServerMessage::ShootingState(ShootingStateMsg {
                is_shooting: flag,
            }));
        }

        self.deliver_to_observer(now);
        let (_, events) = self.observer.pawn.tick(now, dt);
        self.observer.absorb_pawn_events(now, events);
        let current = self.observer.fire_transform();
        let events = self
            .observer
            .weapon
            .tick(now, &current, &mut self.observer.sink);
        self.observer.weapon_events.extend(events);
    }

    /// Advance by `ticks` steps of the configured interval.
    pub fn run(&mut self, ticks: usize) {
        let dt = self.cfg.tick_interval;
        for _ in 0..ticks {
            self.tick(dt);
        }
    }

    fn route_weapon_effects(&mut self, effects: SmallVec<[WeaponEffect; 1]>) {
        for effect in effects {
            let msg = match effect {
                WeaponEffect::StartShooting(m) => ClientMessage::StartShooting(m),
                WeaponEffect::StopShooting(m) => ClientMessage::StopShooting(m),
            };
            self.send_client_message(&msg);
        }
    }

    fn send_client_message(&mut self, msg: &ClientMessage) {
        match encode_client_message(msg) {
            Ok(frame) => match msg.channel() {
                Channel::Unreliable => self.to_authority_unreliable.send(frame),
                Channel::Reliable => self.to_authority_reliable.send(frame),
            },
            Err(e) => tracing::error!("failed to encode client message: {e}"),
        }
    }

    fn send_server_message(&mut self, msg: &ServerMessage) {
        match encode_server_message(msg) {
            Ok(frame) => match msg.channel() {
                Channel::Unreliable => self.to_observer_unreliable.send(frame),
                Channel::Reliable => self.to_observer_reliable.send(frame),
            },
            Err(e) => tracing::error!("failed to encode server message: {e}"),
        }
    }

    // Reliable frames first: discrete transitions land before the
    // continuous state that follows them.
    fn deliver_to_authority(&mut self, now: f32) {
        let frames: Vec<Vec<u8>> = self
            .to_authority_reliable
            .drain()
            .chain(self.to_authority_unreliable.drain())
            .collect();
        for frame in frames {
            match decode_client_message(&frame) {
                Ok(ClientMessage::SetTransform(msg)) => {
                    if let Err(e) = self.authority.pawn.channel.receive_set_transform(
                        now,
                        &msg,
                        &mut self.authority.pawn.body,
                    ) {
                        tracing::error!("{e}");
                    }
                },
                Ok(ClientMessage::StartShooting(msg)) => {
                    match self
                        .authority
                        .weapon
                        .server_start_shooting(now, &msg, &mut self.authority.sink)
                    {
                        Ok(events) => self.authority.weapon_events.extend(events),
                        Err(e) => tracing::error!("{e}"),
                    }
                },
                Ok(ClientMessage::StopShooting(msg)) => {
                    match self.authority.weapon.server_stop_shooting(&msg) {
                        Ok(events) => self.authority.weapon_events.extend(events),
                        Err(e) => tracing::error!("{e}"),
                    }
                },
                Err(e) => tracing::warn!("dropping undecodable client frame: {e}"),
            }
        }
    }

    fn deliver_to_observer(&mut self, now: f32) {
        let frames: Vec<Vec<u8>> = self
            .to_observer_reliable
            .drain()
            .chain(self.to_observer_unreliable.drain())
            .collect();
        for frame in frames {
            match decode_server_message(&frame) {
                Ok(ServerMessage::MovementUpdate(snapshot)) => {
                    if let Err(e) = self
                        .observer
                        .pawn
                        .channel
                        .apply_snapshot(snapshot, &mut self.observer.pawn.body)
                    {
                        tracing::error!("{e}");
                    }
                },
                Ok(ServerMessage::ShootingState(msg)) => {
                    match self.observer.weapon.apply_shooting_flag(now, msg.is_shooting) {
                        Ok(events) => self.observer.weapon_events.extend(events),
                        Err(e) => tracing::error!("{e}"),
                    }
                },
                Ok(ServerMessage::JuggernautState(msg)) => {
                    let events = self.observer.pawn.apply_juggernaut_flag(msg.is_juggernaut);
                    self.observer.absorb_pawn_events(now, events);
                },
                Err(e) => tracing::warn!("dropping undecodable server frame: {e}"),
            }
        }
    }
}
