//! Per-tank state: position, health, derived stats, running statistics

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::SimulationConfig;
use crate::genome::{decode, Genome, Phenotype};
use crate::geometry::{Rect, Vec2};
use crate::tactics::{Avoidance, TacticalState};

/// Survival time at which the survival component of fitness saturates
pub const SURVIVAL_SATURATION_SECS: f32 = 60.0;

/// Golden-ratio step spreading first decisions across the interval
const DECISION_STAGGER: f32 = 0.618_034;

// ============================================================================
// IDENTIFIERS
// ============================================================================

/// Team tag
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Team {
    A,
    B,
}

impl Team {
    pub const ALL: [Team; 2] = [Team::A, Team::B];

    pub fn opponent(self) -> Self {
        match self {
            Team::A => Team::B,
            Team::B => Team::A,
        }
    }

    /// Stable index for per-team arrays
    pub fn index(self) -> usize {
        match self {
            Team::A => 0,
            Team::B => 1,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::A => f.write_str("A"),
            Team::B => f.write_str("B"),
        }
    }
}

/// Index of an agent in the battle's agent arena.
///
/// Agents are never removed from the arena during a battle, so an id stays
/// valid; whether the agent is still alive must be checked on use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub usize);

// ============================================================================
// STATISTICS
// ============================================================================

/// Running combat statistics for one agent
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentStats {
    pub shots_fired: u32,
    pub shots_hit: u32,
    pub damage_dealt: f32,
    pub damage_taken: f32,
    pub kills: u32,
    /// Seconds alive in this battle
    pub survival_time: f32,
    pub engagement_distance_sum: f32,
    pub engagement_samples: u32,
    pub state_changes: u32,
    pub target_switches: u32,
    /// Random repaths forced by the stuck detector
    pub repaths: u32,
    /// Seconds spent in each tactical state
    pub state_time: FxHashMap<TacticalState, f32>,
}

impl AgentStats {
    /// Hit ratio in [0,1]
    pub fn accuracy(&self) -> f32 {
        if self.shots_fired == 0 {
            0.0
        } else {
            self.shots_hit as f32 / self.shots_fired as f32
        }
    }

    /// Dealt / taken, with taken floored at 1
    pub fn damage_ratio(&self) -> f32 {
        self.damage_dealt / self.damage_taken.max(1.0)
    }

    pub fn mean_engagement_distance(&self) -> Option<f32> {
        if self.engagement_samples == 0 {
            None
        } else {
            Some(self.engagement_distance_sum / self.engagement_samples as f32)
        }
    }
}

// ============================================================================
// STUCK DETECTION
// ============================================================================

/// Tracks net displacement over a sliding window
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct StuckDetector {
    anchor: Vec2,
    elapsed: f32,
}

impl StuckDetector {
    fn new(position: Vec2) -> Self {
        Self {
            anchor: position,
            elapsed: 0.0,
        }
    }

    /// Advance the window. Returns true if the agent failed to move
    /// `min_distance` over a full `window`.
    pub(crate) fn update(&mut self, position: Vec2, dt: f32, window: f32, min_distance: f32) -> bool {
        self.elapsed += dt;
        if self.elapsed < window {
            return false;
        }
        let stuck = self.anchor.distance_to(position) < min_distance;
        self.reset(position);
        stuck
    }

    pub(crate) fn reset(&mut self, position: Vec2) {
        self.anchor = position;
        self.elapsed = 0.0;
    }
}

// ============================================================================
// AGENT
// ============================================================================

/// One tank
#[derive(Clone, Debug)]
pub struct Agent {
    pub id: AgentId,
    pub team: Team,
    genome: Genome,
    pub phenotype: Phenotype,
    pub position: Vec2,
    /// Facing in radians
    pub angle: f32,
    health: f32,
    alive: bool,
    target: Option<AgentId>,
    state: TacticalState,
    /// Where the agent is currently heading, if anywhere
    pub move_target: Option<Vec2>,
    /// Temporary waypoint steered to instead of `move_target`
    detour: Option<Vec2>,
    /// Seconds before the detour is abandoned
    detour_timer: f32,
    /// Side held while working around the current obstacle
    pub(crate) avoidance: Option<Avoidance>,
    last_shot_time: Option<f32>,
    /// Seconds until the next tactical re-decision
    pub(crate) decision_timer: f32,
    pub(crate) stuck: StuckDetector,
    pub stats: AgentStats,
}

impl Agent {
    pub fn new(
        id: AgentId,
        team: Team,
        genome: Genome,
        position: Vec2,
        angle: f32,
        config: &SimulationConfig,
    ) -> Self {
        let phenotype = decode(&genome, &config.stats);
        Self {
            id,
            team,
            genome,
            health: phenotype.stats.max_health,
            phenotype,
            position,
            angle,
            alive: true,
            target: None,
            state: TacticalState::Patrol,
            move_target: None,
            detour: None,
            detour_timer: 0.0,
            avoidance: None,
            last_shot_time: None,
            decision_timer: config.decision_interval * (id.0 as f32 * DECISION_STAGGER).fract(),
            stuck: StuckDetector::new(position),
            stats: AgentStats::default(),
        }
    }

    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn max_health(&self) -> f32 {
        self.phenotype.stats.max_health
    }

    pub fn health_fraction(&self) -> f32 {
        self.health / self.max_health()
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn target(&self) -> Option<AgentId> {
        self.target
    }

    pub fn state(&self) -> TacticalState {
        self.state
    }

    pub fn last_shot_time(&self) -> Option<f32> {
        self.last_shot_time
    }

    /// Waypoint currently overriding `move_target`, if any
    pub fn detour(&self) -> Option<Vec2> {
        self.detour
    }

    /// Steer to `point` for at most `lifetime` seconds
    pub(crate) fn set_detour(&mut self, point: Vec2, lifetime: f32) {
        self.detour = Some(point);
        self.detour_timer = lifetime;
    }

    /// Count down the detour lifetime; drops the detour once it runs out
    pub(crate) fn age_detour(&mut self, dt: f32) {
        if self.detour.is_some() {
            self.detour_timer -= dt;
            if self.detour_timer <= 0.0 {
                self.detour = None;
            }
        }
    }

    /// Drop the detour waypoint, keeping the avoidance side
    pub(crate) fn finish_detour(&mut self) {
        self.detour = None;
        self.detour_timer = 0.0;
    }

    pub(crate) fn clear_detour(&mut self) {
        self.finish_detour();
        self.avoidance = None;
    }

    pub fn hitbox(&self, size: f32) -> Rect {
        Rect::centered(self.position, size)
    }

    /// Point just ahead of the hull along the current facing
    pub fn muzzle_point(&self, size: f32) -> Vec2 {
        self.position + Vec2::from_angle(self.angle) * (size / 2.0 + 2.0)
    }

    /// Apply damage. Returns true exactly once: on the call that takes
    /// health to zero. Dead agents ignore further damage.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if !self.alive {
            return false;
        }
        let amount = if amount.is_finite() { amount.max(0.0) } else { 0.0 };
        self.health = (self.health - amount).max(0.0);
        self.stats.damage_taken += amount;

        if self.health <= 0.0 {
            self.alive = false;
            self.target = None;
            self.move_target = None;
            self.clear_detour();
            true
        } else {
            false
        }
    }

    /// Alive and the weapon has cycled since the last shot
    pub fn can_fire(&self, now: f32) -> bool {
        if !self.alive {
            return false;
        }
        match self.last_shot_time {
            None => true,
            Some(last) => now - last >= self.phenotype.stats.fire_interval(),
        }
    }

    pub(crate) fn record_shot(&mut self, now: f32) {
        self.last_shot_time = Some(now);
        self.stats.shots_fired += 1;
    }

    /// Transition to `state`; counts a change unless it is the current one
    pub fn set_state(&mut self, state: TacticalState) {
        if self.state != state {
            self.state = state;
            self.stats.state_changes += 1;
        }
    }

    /// Switch target; counts a switch unless unchanged
    pub fn set_target(&mut self, target: Option<AgentId>) {
        if self.target != target {
            self.target = target;
            self.stats.target_switches += 1;
        }
    }

    pub(crate) fn record_engagement(&mut self, distance: f32) {
        self.stats.engagement_distance_sum += distance;
        self.stats.engagement_samples += 1;
    }

    /// Advance per-tick bookkeeping for a live agent
    pub(crate) fn accrue_time(&mut self, dt: f32) {
        if !self.alive {
            return;
        }
        self.stats.survival_time += dt;
        *self.stats.state_time.entry(self.state).or_insert(0.0) += dt;
    }

    /// Fitness rewarding survival over raw kill count.
    ///
    /// Dead: `0.4*survival + 0.3*damage_ratio + 0.2*accuracy + 0.1*kills`.
    /// Alive: `0.3 + 0.3*damage_ratio + 0.2*accuracy + 0.2*kills`.
    pub fn calculate_fitness(&self) -> f32 {
        let s = &self.stats;
        let damage_ratio = s.damage_ratio();
        let accuracy = s.accuracy();
        let kills = s.kills as f32;

        if self.alive {
            0.3 + 0.3 * damage_ratio + 0.2 * accuracy + 0.2 * kills
        } else {
            let survival_ratio = (s.survival_time / SURVIVAL_SATURATION_SECS).min(1.0);
            0.4 * survival_ratio + 0.3 * damage_ratio + 0.2 * accuracy + 0.1 * kills
        }
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id,
            team: self.team,
            position: self.position,
            angle: self.angle,
            health: self.health,
            max_health: self.max_health(),
            alive: self.alive,
            state: self.state,
            target: self.target,
            stats: self.stats.clone(),
        }
    }
}

/// Read-only view of an agent for rendering and analytics
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub team: Team,
    pub position: Vec2,
    pub angle: f32,
    pub health: f32,
    pub max_health: f32,
    pub alive: bool,
    pub state: TacticalState,
    pub target: Option<AgentId>,
    pub stats: AgentStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_agent() -> Agent {
        Agent::new(
            AgentId(0),
            Team::A,
            Genome::default(),
            Vec2::new(100.0, 100.0),
            0.0,
            &SimulationConfig::default(),
        )
    }

    #[test]
    fn test_take_damage_flips_alive_once() {
        let mut agent = make_agent();
        let max = agent.max_health();

        assert!(!agent.take_damage(max - 1.0));
        assert!(agent.is_alive());
        assert!(agent.take_damage(5.0));
        assert!(!agent.is_alive());
        assert_eq!(agent.health(), 0.0);

        // Already dead: no-op
        assert!(!agent.take_damage(10.0));
        assert!((agent.stats.damage_taken - (max + 4.0)).abs() < 1e-3);
    }

    #[test]
    fn test_take_damage_never_heals() {
        let mut agent = make_agent();
        let before = agent.health();
        agent.take_damage(-20.0);
        agent.take_damage(f32::NAN);
        assert_eq!(agent.health(), before);

        let mut prev = agent.health();
        for _ in 0..20 {
            agent.take_damage(7.5);
            assert!(agent.health() <= prev);
            prev = agent.health();
        }
    }

    #[test]
    fn test_can_fire_respects_interval() {
        let mut agent = make_agent();
        assert!(agent.can_fire(0.0));
        agent.record_shot(0.0);
        // 1.25 shots/s -> 0.8 s interval
        assert!(!agent.can_fire(0.5));
        assert!(agent.can_fire(0.8));
        assert_eq!(agent.stats.shots_fired, 1);

        agent.take_damage(1000.0);
        assert!(!agent.can_fire(10.0));
    }

    #[test]
    fn test_set_state_and_target_idempotent() {
        let mut agent = make_agent();
        agent.set_state(TacticalState::Patrol);
        assert_eq!(agent.stats.state_changes, 0);
        agent.set_state(TacticalState::Attack);
        agent.set_state(TacticalState::Attack);
        assert_eq!(agent.stats.state_changes, 1);

        agent.set_target(None);
        assert_eq!(agent.stats.target_switches, 0);
        agent.set_target(Some(AgentId(3)));
        agent.set_target(Some(AgentId(3)));
        assert_eq!(agent.stats.target_switches, 1);
    }

    #[test]
    fn test_fitness_alive_regime() {
        let mut agent = make_agent();
        agent.stats.shots_fired = 10;
        agent.stats.shots_hit = 5;
        agent.stats.damage_dealt = 50.0;
        agent.stats.damage_taken = 25.0;
        agent.stats.kills = 1;
        // 0.3 + 0.3*2 + 0.2*0.5 + 0.2*1
        assert!((agent.calculate_fitness() - 1.2).abs() < 1e-5);
    }

    #[test]
    fn test_fitness_dead_regime() {
        let mut agent = make_agent();
        agent.stats.survival_time = 30.0;
        agent.stats.shots_fired = 4;
        agent.stats.shots_hit = 1;
        agent.stats.damage_dealt = 0.0;
        agent.take_damage(1000.0);
        // 0.4*0.5 + 0.3*0 + 0.2*0.25 + 0.1*0
        assert!((agent.calculate_fitness() - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_accrue_time_tracks_state_dwell() {
        let mut agent = make_agent();
        agent.accrue_time(0.5);
        agent.set_state(TacticalState::Attack);
        agent.accrue_time(0.25);
        assert!((agent.stats.survival_time - 0.75).abs() < 1e-6);
        assert_eq!(agent.stats.state_time.get(&TacticalState::Patrol), Some(&0.5));
        assert_eq!(agent.stats.state_time.get(&TacticalState::Attack), Some(&0.25));
    }

    #[test]
    fn test_stuck_detector() {
        let mut detector = StuckDetector::new(Vec2::ZERO);
        assert!(!detector.update(Vec2::new(1.0, 0.0), 1.0, 1.5, 5.0));
        assert!(detector.update(Vec2::new(2.0, 0.0), 1.0, 1.5, 5.0));
        assert!(!detector.update(Vec2::new(30.0, 0.0), 2.0, 1.5, 5.0));
    }

    #[test]
    fn test_decision_timers_staggered() {
        let config = SimulationConfig::default();
        let timers: Vec<f32> = (0..5)
            .map(|i| {
                Agent::new(AgentId(i), Team::A, Genome::default(), Vec2::ZERO, 0.0, &config)
                    .decision_timer
            })
            .collect();

        assert_eq!(timers[0], 0.0);
        for (i, t) in timers.iter().enumerate() {
            assert!(*t >= 0.0 && *t < config.decision_interval);
            for other in &timers[i + 1..] {
                assert!((t - other).abs() > 1e-4);
            }
        }
    }

    #[test]
    fn test_detour_expires() {
        let mut agent = make_agent();
        agent.set_detour(Vec2::new(120.0, 100.0), 0.2);
        agent.age_detour(0.1);
        assert_eq!(agent.detour(), Some(Vec2::new(120.0, 100.0)));
        agent.age_detour(0.1);
        assert_eq!(agent.detour(), None);

        agent.set_detour(Vec2::new(120.0, 100.0), 1.0);
        agent.take_damage(1000.0);
        assert_eq!(agent.detour(), None);
    }
}
