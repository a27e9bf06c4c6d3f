//! King-of-the-hill objective
//!
//! Control is the pair (`controlling_team`, `control_progress`). Each update
//! classifies who is on the hill and moves progress accordingly:
//!
//! - one team alone: climbs at `100 / capture_time` per second, or erodes an
//!   enemy hold at `enemy_decay` and takes over once progress hits zero
//! - both teams: progress decays at `contested_decay`, control never changes
//! - nobody: progress decays at `empty_decay`, reaching zero neutralizes
//!
//! At full progress the holder scores `points_per_second * dt`.

use serde::{Deserialize, Serialize};

use crate::agent::Team;
use crate::config::ObjectiveConfig;
use crate::geometry::Vec2;
use crate::perception::AgentView;

pub const FULL_CONTROL: f32 = 100.0;

/// Observable hill state after the last update
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HillStatus {
    Neutral,
    /// Team is alone on the hill and climbing
    Capturing(Team),
    /// Team holds the hill at full progress
    Controlled(Team),
    /// Both teams present
    Contested,
    /// An enemy (the payload) is alone on a hill held by the other team
    Reverting(Team),
    /// Hill held by the payload team but empty
    Decaying(Team),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureKind {
    /// Progress reached 100
    Captured,
    /// Control passed to the other team
    Flipped,
    /// Empty hill decayed back to neutral
    Neutralized,
}

/// Entry in the hill's capture log
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaptureEvent {
    pub time: f32,
    pub team: Team,
    pub kind: CaptureKind,
}

/// Capture / contest / score state machine
#[derive(Clone, Debug)]
pub struct Hill {
    center: Vec2,
    config: ObjectiveConfig,
    controlling_team: Option<Team>,
    control_progress: f32,
    scores: [f32; 2],
    status: HillStatus,
    events: Vec<CaptureEvent>,
    winner: Option<Team>,
}

impl Hill {
    pub fn new(center: Vec2, config: ObjectiveConfig) -> Self {
        Self {
            center,
            config,
            controlling_team: None,
            control_progress: 0.0,
            scores: [0.0; 2],
            status: HillStatus::Neutral,
            events: Vec::new(),
            winner: None,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.config.radius
    }

    pub fn contest_radius(&self) -> f32 {
        self.config.contest_radius
    }

    pub fn controlling_team(&self) -> Option<Team> {
        self.controlling_team
    }

    pub fn control_progress(&self) -> f32 {
        self.control_progress
    }

    pub fn score(&self, team: Team) -> f32 {
        self.scores[team.index()]
    }

    pub fn status(&self) -> HillStatus {
        self.status
    }

    pub fn events(&self) -> &[CaptureEvent] {
        &self.events
    }

    pub fn winner(&self) -> Option<Team> {
        self.winner
    }

    pub fn config(&self) -> &ObjectiveConfig {
        &self.config
    }

    /// Advance one tick. Returns the winner once a score reaches max.
    pub fn update(&mut self, dt: f32, now: f32, agents: &[AgentView]) -> Option<Team> {
        if self.winner.is_some() {
            return self.winner;
        }

        let presence = self.presence(agents);
        self.update_control(dt, now, presence);
        self.accrue_score(dt);

        self.winner
    }

    /// Whether each team is on the hill / within contest range
    fn presence(&self, agents: &[AgentView]) -> Presence {
        let mut p = Presence::default();
        for a in agents.iter().filter(|a| a.alive) {
            let d = a.position.distance_to(self.center);
            let i = a.team.index();
            if d <= self.config.radius {
                p.on_hill[i] = true;
            }
            if d <= self.config.contest_radius {
                p.contesting[i] = true;
            }
        }
        p
    }

    fn update_control(&mut self, dt: f32, now: f32, presence: Presence) {
        let [a_on, b_on] = presence.on_hill;
        let [a_near, b_near] = presence.contesting;

        if (a_on && b_near) || (b_on && a_near) {
            self.control_progress = (self.control_progress - self.config.contested_decay * dt).max(0.0);
            self.status = HillStatus::Contested;
            return;
        }

        let sole = match (a_on, b_on) {
            (true, false) => Some(Team::A),
            (false, true) => Some(Team::B),
            _ => None,
        };

        match (sole, self.controlling_team) {
            (Some(team), None) => {
                self.controlling_team = Some(team);
                self.control_progress = 0.0;
                self.climb(team, dt, now);
            }
            (Some(team), Some(holder)) if team == holder => {
                self.climb(team, dt, now);
            }
            (Some(team), Some(_)) => {
                self.control_progress -= self.config.enemy_decay * dt;
                self.status = HillStatus::Reverting(team);
                if self.control_progress <= 0.0 {
                    self.control_progress = 0.0;
                    self.controlling_team = Some(team);
                    self.status = HillStatus::Capturing(team);
                    self.log(now, team, CaptureKind::Flipped);
                }
            }
            (None, Some(holder)) => {
                self.control_progress -= self.config.empty_decay * dt;
                self.status = HillStatus::Decaying(holder);
                if self.control_progress <= 0.0 {
                    self.control_progress = 0.0;
                    self.controlling_team = None;
                    self.status = HillStatus::Neutral;
                    self.log(now, holder, CaptureKind::Neutralized);
                }
            }
            (None, None) => {
                self.control_progress = 0.0;
                self.status = HillStatus::Neutral;
            }
        }
    }

    fn climb(&mut self, team: Team, dt: f32, now: f32) {
        let before = self.control_progress;
        self.control_progress = (before + self.config.capture_rate() * dt).min(FULL_CONTROL);
        if self.control_progress >= FULL_CONTROL {
            if before < FULL_CONTROL {
                self.log(now, team, CaptureKind::Captured);
            }
            self.status = HillStatus::Controlled(team);
        } else {
            self.status = HillStatus::Capturing(team);
        }
    }

    fn accrue_score(&mut self, dt: f32) {
        let Some(team) = self.controlling_team else {
            return;
        };
        if self.control_progress < FULL_CONTROL {
            return;
        }
        let score = &mut self.scores[team.index()];
        *score += self.config.points_per_second * dt;
        if *score >= self.config.max_score {
            self.winner = Some(team);
            tracing::debug!("Team {} won the hill with {:.1} points", team, *score);
        }
    }

    fn log(&mut self, time: f32, team: Team, kind: CaptureKind) {
        tracing::trace!("Hill {:?} by team {} at t={:.2}", kind, team, time);
        self.events.push(CaptureEvent { time, team, kind });
    }

    pub fn snapshot(&self) -> HillSnapshot {
        HillSnapshot {
            center: self.center,
            radius: self.config.radius,
            controlling_team: self.controlling_team,
            control_progress: self.control_progress,
            score_a: self.scores[Team::A.index()],
            score_b: self.scores[Team::B.index()],
            status: self.status,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Presence {
    on_hill: [bool; 2],
    contesting: [bool; 2],
}

/// Read-only view of the hill
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HillSnapshot {
    pub center: Vec2,
    pub radius: f32,
    pub controlling_team: Option<Team>,
    pub control_progress: f32,
    pub score_a: f32,
    pub score_b: f32,
    pub status: HillStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentId;

    const DT: f32 = 0.1;

    fn view(id: usize, team: Team, x: f32, y: f32) -> AgentView {
        AgentView {
            id: AgentId(id),
            team,
            position: Vec2::new(x, y),
            health: 100.0,
            max_health: 100.0,
            alive: true,
        }
    }

    fn hill() -> Hill {
        Hill::new(Vec2::new(500.0, 350.0), ObjectiveConfig::default())
    }

    fn run(h: &mut Hill, agents: &[AgentView], secs: f32) {
        let steps = (secs / DT).round() as usize;
        for i in 0..steps {
            h.update(DT, i as f32 * DT, agents);
        }
    }

    #[test]
    fn test_capture_takes_three_seconds() {
        let mut h = hill();
        let a = [view(0, Team::A, 500.0, 350.0)];

        run(&mut h, &a, 1.5);
        assert_eq!(h.controlling_team(), Some(Team::A));
        assert!((h.control_progress() - 50.0).abs() < 0.5);
        assert_eq!(h.status(), HillStatus::Capturing(Team::A));
        assert_eq!(h.score(Team::A), 0.0);

        run(&mut h, &a, 1.6);
        assert_eq!(h.control_progress(), FULL_CONTROL);
        assert_eq!(h.status(), HillStatus::Controlled(Team::A));
        assert!(h.events().iter().any(|e| e.kind == CaptureKind::Captured && e.team == Team::A));
    }

    #[test]
    fn test_contested_decays_without_flip() {
        let mut h = hill();
        run(&mut h, &[view(0, Team::A, 500.0, 350.0)], 3.5);
        assert_eq!(h.control_progress(), FULL_CONTROL);

        let both = [view(0, Team::A, 500.0, 350.0), view(1, Team::B, 560.0, 350.0)];
        run(&mut h, &both, 1.0);
        assert_eq!(h.status(), HillStatus::Contested);
        assert_eq!(h.controlling_team(), Some(Team::A));
        assert!((h.control_progress() - 70.0).abs() < 0.5);
    }

    #[test]
    fn test_enemy_alone_flips_control() {
        let mut h = hill();
        run(&mut h, &[view(0, Team::A, 500.0, 350.0)], 3.5);

        let b = [view(1, Team::B, 500.0, 350.0)];
        run(&mut h, &b, 1.0);
        assert_eq!(h.status(), HillStatus::Reverting(Team::B));
        assert!((h.control_progress() - 60.0).abs() < 0.5);

        run(&mut h, &b, 1.6);
        assert_eq!(h.controlling_team(), Some(Team::B));
        assert!(h.control_progress() < 10.0);
        assert!(h.events().iter().any(|e| e.kind == CaptureKind::Flipped && e.team == Team::B));
    }

    #[test]
    fn test_empty_hill_decays_to_neutral() {
        let mut h = hill();
        run(&mut h, &[view(0, Team::A, 500.0, 350.0)], 1.5);
        let progress = h.control_progress();
        run(&mut h, &[], 1.0);
        assert_eq!(h.status(), HillStatus::Decaying(Team::A));
        assert!((h.control_progress() - (progress - 10.0)).abs() < 0.5);

        run(&mut h, &[], 10.0);
        assert_eq!(h.controlling_team(), None);
        assert_eq!(h.status(), HillStatus::Neutral);
    }

    #[test]
    fn test_score_monotonic_and_winner_at_max() {
        let mut config = ObjectiveConfig::default();
        config.max_score = 5.0;
        config.points_per_second = 2.0;
        let mut h = Hill::new(Vec2::new(500.0, 350.0), config);
        let a = [view(0, Team::A, 500.0, 350.0)];

        let mut last = 0.0;
        let mut winner = None;
        for i in 0..200 {
            winner = h.update(DT, i as f32 * DT, &a);
            assert!(h.score(Team::A) >= last);
            last = h.score(Team::A);
            if winner.is_some() {
                break;
            }
            assert!(h.score(Team::A) < 5.0);
        }
        assert_eq!(winner, Some(Team::A));
        assert!(h.score(Team::A) >= 5.0);
        assert_eq!(h.score(Team::B), 0.0);
    }

    #[test]
    fn test_dead_agents_do_not_count() {
        let mut h = hill();
        let mut dead = view(0, Team::A, 500.0, 350.0);
        dead.alive = false;
        run(&mut h, &[dead], 1.0);
        assert_eq!(h.controlling_team(), None);
    }
}
