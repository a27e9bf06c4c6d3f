//! Combat resolution: fire gating, projectile ballistics, hit application

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentId, Team};
use crate::config::SimulationConfig;
use crate::geometry::{angle_difference, has_line_of_sight, segment_rect_entry, Rect, Vec2};
use crate::perception::AgentView;

/// Aiming tolerance at zero accuracy (45 degrees)
const MAX_AIM_TOLERANCE: f32 = std::f32::consts::FRAC_PI_4;

/// Angular spread at zero accuracy (radians)
const MAX_SPREAD: f32 = 0.2;

// ============================================================================
// FIRE GATING
// ============================================================================

/// Facing tolerance for an agent with the given accuracy
pub fn aim_tolerance(accuracy: f32) -> f32 {
    (1.0 - accuracy) * MAX_AIM_TOLERANCE
}

/// Target alive, in range, visible, and within the aiming cone
pub fn should_fire(shooter: &Agent, target: &AgentView, obstacles: &[Rect]) -> bool {
    if !target.alive || !shooter.is_alive() {
        return false;
    }
    let stats = &shooter.phenotype.stats;
    if shooter.position.distance_to(target.position) > stats.range {
        return false;
    }
    if !has_line_of_sight(shooter.position, target.position, obstacles) {
        return false;
    }
    let bearing = shooter.position.angle_to(target.position);
    angle_difference(shooter.angle, bearing).abs() <= aim_tolerance(stats.accuracy)
}

/// Spawn a projectile if the weapon has cycled. Records the shot.
pub fn fire<R: Rng>(
    shooter: &mut Agent,
    now: f32,
    config: &SimulationConfig,
    rng: &mut R,
) -> Option<Projectile> {
    if !shooter.can_fire(now) {
        return None;
    }

    let stats = shooter.phenotype.stats;
    let spread = (1.0 - stats.accuracy) * MAX_SPREAD;
    let jitter = if spread > 0.0 {
        rng.gen_range(-spread..=spread)
    } else {
        0.0
    };
    let heading = shooter.angle + jitter;

    shooter.record_shot(now);

    Some(Projectile {
        position: shooter.muzzle_point(config.tank_size),
        velocity: Vec2::from_angle(heading) * config.projectile_speed,
        remaining: config.projectile_lifetime,
        owner: shooter.id,
        team: shooter.team,
        damage: stats.damage,
        removed: false,
        expired: false,
    })
}

// ============================================================================
// PROJECTILE
// ============================================================================

/// Credit owed to the shooter after a hit
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitReport {
    pub shooter: AgentId,
    pub target: AgentId,
    pub damage: f32,
    pub killed: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Projectile {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Seconds left before expiry
    pub remaining: f32,
    /// Firing agent (non-owning)
    pub owner: AgentId,
    pub team: Team,
    pub damage: f32,
    /// Stopped by an obstacle or an agent
    removed: bool,
    /// Ran out of lifetime or left the battlefield
    expired: bool,
}

impl Projectile {
    pub fn is_removed(&self) -> bool {
        self.removed || self.expired
    }

    pub fn remove(&mut self) {
        self.removed = true;
    }

    /// Linear motion. Returns the previous position for swept tests.
    ///
    /// Expiry and leaving the field mark the projectile for removal, but the
    /// step it travelled this tick can still land a hit.
    pub fn update(&mut self, dt: f32, config: &SimulationConfig) -> Vec2 {
        let previous = self.position;
        if self.is_removed() {
            return previous;
        }
        self.position = self.position + self.velocity * dt;
        self.remaining -= dt;
        if self.remaining <= 0.0 || !config.in_bounds(self.position) {
            self.expired = true;
        }
        previous
    }

    /// Fraction of the step from `previous` at which the path enters `rect`
    pub fn swept_entry(&self, previous: Vec2, rect: &Rect) -> Option<f32> {
        segment_rect_entry(previous, self.position, rect)
    }

    /// Apply this projectile to `target`. No-op for allies, dead targets or
    /// a projectile that already hit something.
    pub fn hit(&mut self, target: &mut Agent) -> Option<HitReport> {
        if self.removed || target.team == self.team || !target.is_alive() {
            return None;
        }
        self.removed = true;

        let damage = self.damage * (1.0 - target.phenotype.stats.armor);
        let killed = target.take_damage(damage);
        Some(HitReport {
            shooter: self.owner,
            target: target.id,
            damage,
            killed,
        })
    }

    pub fn snapshot(&self) -> ProjectileSnapshot {
        ProjectileSnapshot {
            position: self.position,
            team: self.team,
        }
    }
}

/// Credit the shooter for a landed hit
pub fn credit_hit(shooter: &mut Agent, report: &HitReport) {
    shooter.stats.shots_hit += 1;
    shooter.stats.damage_dealt += report.damage;
    if report.killed {
        shooter.stats.kills += 1;
    }
}

/// Read-only view of a projectile
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    pub position: Vec2,
    pub team: Team,
}
