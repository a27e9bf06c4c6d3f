//! Tactical controller - the six-state decision machine and movement
//!
//! Re-decision runs on a per-agent countdown (`decision_interval`), behavior
//! and movement run every tick so agents keep moving between decisions.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

use crate::agent::Agent;
use crate::config::SimulationConfig;
use crate::geometry::{angle_difference, collides_with_obstacles, Rect, Vec2};
use crate::perception::{nearest_ally, AgentView, Contact, ObjectiveStatus, Perception};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Health fraction below which a cautious agent retreats
const RETREAT_HEALTH: f32 = 0.3;
/// Caution weight needed to retreat
const RETREAT_CAUTION: f32 = 0.6;
/// Health fraction above which a retreating agent may resume patrol
const RECOVERED_HEALTH: f32 = 0.5;
/// Distance a retreat point is placed from the threat
const RETREAT_DISTANCE: f32 = 200.0;
/// Cooperation weight that makes an isolated agent regroup
const GROUP_COOPERATION: f32 = 0.6;
/// Hill priority above which an agent keeps pushing onto the hill
const HILL_PRIORITY: f32 = 0.5;
/// Caution weight required to back off from a too-close target
const BACKOFF_CAUTION: f32 = 0.4;
/// Flanking weight above which approach paths are offset sideways
const FLANK_THRESHOLD: f32 = 0.6;
/// Distance at which a patrol waypoint counts as reached
const WAYPOINT_REACHED: f32 = 20.0;
/// Distance at which any movement goal counts as reached
const ARRIVAL_EPSILON: f32 = 1.0;
/// Margin kept from the battlefield edge when picking random waypoints
const WAYPOINT_MARGIN: f32 = 40.0;

// ============================================================================
// STATES
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TacticalState {
    Patrol,
    Attack,
    Retreat,
    Group,
    SeekHill,
    DefendHill,
}

/// Read-only world context shared by every agent in a tick
pub struct TacticContext<'a> {
    pub config: &'a SimulationConfig,
    pub obstacles: &'a [Rect],
    pub world: &'a [AgentView],
}

// ============================================================================
// DECISION
// ============================================================================

/// Pick the state for this decision tick. First matching rule wins.
pub fn decide_state(agent: &Agent, perception: &Perception) -> TacticalState {
    let weights = &agent.phenotype.weights;
    let stats = &agent.phenotype.stats;

    if agent.health_fraction() < RETREAT_HEALTH && weights.caution > RETREAT_CAUTION {
        return TacticalState::Retreat;
    }

    if let Some(nearest) = perception.nearest_enemy() {
        if nearest.distance <= stats.engagement_range() {
            return TacticalState::Attack;
        }
    }

    if let Some(obj) = &perception.objective {
        if obj.distance <= 2.0 * obj.radius {
            return if weights.hill_priority > HILL_PRIORITY || obj.not_held_by(agent.team) {
                TacticalState::SeekHill
            } else {
                TacticalState::DefendHill
            };
        }
    }

    if weights.cooperation > GROUP_COOPERATION && perception.nearby_allies.is_empty() {
        return TacticalState::Group;
    }

    TacticalState::Patrol
}

/// Score a candidate target: favors close, weak enemies
pub fn target_score(contact: &Contact, range: f32) -> f32 {
    0.6 * (1.0 - contact.distance / range) + 0.4 * (1.0 - contact.health_fraction)
}

/// Highest-scoring contact
pub fn best_target<'a, I>(candidates: I, range: f32) -> Option<&'a Contact>
where
    I: IntoIterator<Item = &'a Contact>,
{
    candidates.into_iter().max_by(|a, b| {
        target_score(a, range)
            .partial_cmp(&target_score(b, range))
            .unwrap_or(std::cmp::Ordering::Equal)
    })
}

// ============================================================================
// BEHAVIOR
// ============================================================================

/// Run the decision countdown and the current state's behavior.
///
/// Returns the point the agent wants to face, if any.
pub fn update_agent<R: Rng>(
    agent: &mut Agent,
    perception: &Perception,
    ctx: &TacticContext<'_>,
    dt: f32,
    rng: &mut R,
) -> Option<Vec2> {
    agent.decision_timer -= dt;
    if agent.decision_timer <= 0.0 {
        let next = decide_state(agent, perception);
        agent.set_state(next);
        agent.decision_timer = ctx.config.decision_interval;
    }

    match agent.state() {
        TacticalState::Patrol => patrol(agent, perception, ctx, rng),
        TacticalState::Attack => attack(agent, perception),
        TacticalState::Retreat => retreat(agent, perception, ctx),
        TacticalState::Group => group(agent, perception, ctx, rng),
        TacticalState::SeekHill => seek_hill(agent, perception, ctx, rng),
        TacticalState::DefendHill => defend_hill(agent, perception, ctx, rng),
    }
}

fn patrol<R: Rng>(
    agent: &mut Agent,
    perception: &Perception,
    ctx: &TacticContext<'_>,
    rng: &mut R,
) -> Option<Vec2> {
    let needs_waypoint = match agent.move_target {
        None => true,
        Some(goal) => agent.position.distance_to(goal) <= WAYPOINT_REACHED,
    };
    if needs_waypoint {
        agent.move_target = Some(patrol_waypoint(agent, perception.objective.as_ref(), ctx.config, rng));
    }

    let nearest = perception.nearest_enemy().copied();
    agent.set_target(nearest.map(|c| c.id));
    nearest.map(|c| c.position)
}

/// Orbit the objective with probability `objective_focus`, else roam
fn patrol_waypoint<R: Rng>(
    agent: &Agent,
    objective: Option<&ObjectiveStatus>,
    config: &SimulationConfig,
    rng: &mut R,
) -> Vec2 {
    if let Some(obj) = objective {
        if rng.gen::<f32>() < agent.phenotype.weights.objective_focus {
            let angle = rng.gen_range(0.0..2.0 * PI);
            let dist = obj.radius * rng.gen_range(2.0..=4.0);
            return config.clamp_to_bounds(obj.center + Vec2::from_angle(angle) * dist);
        }
    }
    random_point(config, rng)
}

/// Uniform random point inside the battlefield margins
pub fn random_point<R: Rng>(config: &SimulationConfig, rng: &mut R) -> Vec2 {
    let margin = WAYPOINT_MARGIN.min(config.width / 4.0).min(config.height / 4.0);
    Vec2::new(
        rng.gen_range(margin..=config.width - margin),
        rng.gen_range(margin..=config.height - margin),
    )
}

fn attack(agent: &mut Agent, perception: &Perception) -> Option<Vec2> {
    let range = agent.phenotype.stats.range;
    let target = validated_target(agent, perception, |_| true)
        .or_else(|| best_target(&perception.visible_enemies, range).copied());

    let Some(target) = target else {
        agent.set_target(None);
        agent.move_target = None;
        return None;
    };
    agent.set_target(Some(target.id));
    agent.record_engagement(target.distance);

    let engagement = agent.phenotype.stats.engagement_range();
    let weights = agent.phenotype.weights;
    agent.move_target = if target.distance > engagement {
        Some(approach_point(agent.position, target.position, weights.flanking))
    } else if target.distance < engagement * 0.5 && weights.caution > BACKOFF_CAUTION {
        let away = (agent.position - target.position)
            .normalized()
            .unwrap_or_else(|| Vec2::from_angle(agent.angle + PI));
        Some(agent.position + away * (engagement * 0.5))
    } else {
        None
    };

    Some(target.position)
}

/// Straight at the target, or swung out to the side for flankers
fn approach_point(from: Vec2, to: Vec2, flanking: f32) -> Vec2 {
    if flanking <= FLANK_THRESHOLD {
        return to;
    }
    match (to - from).normalized() {
        Some(dir) => to + dir.perpendicular() * (flanking * 60.0),
        None => to,
    }
}

/// Current target if it is still alive, in range and visible
fn validated_target<F>(agent: &Agent, perception: &Perception, filter: F) -> Option<Contact>
where
    F: Fn(&Contact) -> bool,
{
    let id = agent.target()?;
    perception.enemy(id).copied().filter(|c| filter(c))
}

fn retreat(agent: &mut Agent, perception: &Perception, ctx: &TacticContext<'_>) -> Option<Vec2> {
    if agent.health_fraction() > RECOVERED_HEALTH && perception.visible_enemies.is_empty() {
        agent.set_state(TacticalState::Patrol);
        agent.move_target = None;
        agent.set_target(None);
        return None;
    }

    let threat = if perception.visible_enemies.is_empty() {
        ctx.config.center()
    } else {
        let n = perception.visible_enemies.len() as f32;
        let sum = perception
            .visible_enemies
            .iter()
            .fold(Vec2::ZERO, |acc, c| acc + c.position);
        sum * (1.0 / n)
    };

    let away = (agent.position - threat)
        .normalized()
        .unwrap_or_else(|| Vec2::from_angle(agent.angle + PI));
    agent.move_target = Some(ctx.config.clamp_to_bounds(agent.position + away * RETREAT_DISTANCE));

    let nearest = perception.nearest_enemy().copied();
    agent.set_target(nearest.map(|c| c.id));
    nearest.map(|c| c.position)
}

fn group<R: Rng>(
    agent: &mut Agent,
    perception: &Perception,
    ctx: &TacticContext<'_>,
    rng: &mut R,
) -> Option<Vec2> {
    let ally = if perception.nearby_allies.is_empty() {
        nearest_ally(agent, ctx.world)
    } else {
        None
    };

    match ally {
        Some(ally) => {
            agent.move_target = Some(ally.position);
            let nearest = perception.nearest_enemy().copied();
            agent.set_target(nearest.map(|c| c.id));
            nearest.map(|c| c.position)
        }
        None => {
            // Either regrouped already or nobody left to group with
            agent.set_state(TacticalState::Patrol);
            patrol(agent, perception, ctx, rng)
        }
    }
}

fn seek_hill<R: Rng>(
    agent: &mut Agent,
    perception: &Perception,
    ctx: &TacticContext<'_>,
    rng: &mut R,
) -> Option<Vec2> {
    let Some(obj) = perception.objective else {
        agent.set_state(TacticalState::Patrol);
        return patrol(agent, perception, ctx, rng);
    };

    if obj.distance <= obj.radius {
        agent.set_state(TacticalState::DefendHill);
        return defend_hill(agent, perception, ctx, rng);
    }

    agent.move_target = Some(obj.center);
    let nearest = perception.nearest_enemy().copied();
    agent.set_target(nearest.map(|c| c.id));
    nearest.map(|c| c.position)
}

fn defend_hill<R: Rng>(
    agent: &mut Agent,
    perception: &Perception,
    ctx: &TacticContext<'_>,
    rng: &mut R,
) -> Option<Vec2> {
    let Some(obj) = perception.objective else {
        agent.set_state(TacticalState::Patrol);
        return patrol(agent, perception, ctx, rng);
    };

    agent.move_target = if obj.distance > 1.5 * obj.radius {
        Some(obj.center)
    } else {
        None
    };

    let guard_radius = 2.0 * obj.radius;
    let near_hill = |c: &Contact| c.position.distance_to(obj.center) <= guard_radius;
    let range = agent.phenotype.stats.range;
    let target = validated_target(agent, perception, near_hill).or_else(|| {
        best_target(perception.visible_enemies.iter().filter(|&c| near_hill(c)), range).copied()
    });

    agent.set_target(target.map(|c| c.id));
    if let Some(t) = &target {
        agent.record_engagement(t.distance);
    }
    target.map(|c| c.position)
}

// ============================================================================
// MOVEMENT
// ============================================================================

/// Side an agent keeps to while working around one obstacle.
///
/// Held until a clear step brings the agent closer to its goal than it was
/// when the obstacle was first met, so consecutive side-steps slide along
/// the same face instead of bouncing between both sides.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Avoidance {
    /// Unit offset direction of the detours
    pub side: Vec2,
    /// Goal distance when the obstacle was first met
    pub start_distance: f32,
}

/// Turn toward `aim` (or the travel direction) and step toward the
/// movement goal, side-stepping obstacles and repathing when stuck.
///
/// Detours live in their own slot on the agent, so behaviors may rewrite
/// `move_target` every tick without cancelling an avoidance in progress.
pub fn execute_movement<R: Rng>(
    agent: &mut Agent,
    aim: Option<Vec2>,
    ctx: &TacticContext<'_>,
    dt: f32,
    rng: &mut R,
) {
    let travel_dir = match agent.move_target {
        Some(goal) => steer(agent, goal, ctx, dt, rng),
        None => {
            agent.clear_detour();
            agent.stuck.reset(agent.position);
            None
        }
    };

    let desired = match (aim, travel_dir) {
        (Some(point), _) => (point - agent.position).normalized().map(|d| d.angle()),
        (None, Some(dir)) => Some(dir.angle()),
        (None, None) => None,
    };
    if let Some(desired) = desired {
        let max_turn = ctx.config.turn_rate * dt;
        let diff = angle_difference(agent.angle, desired).clamp(-max_turn, max_turn);
        agent.angle = crate::geometry::normalize_angle(agent.angle + diff);
    }
}

/// One movement step toward the detour if there is one, else the goal.
/// Returns the travel direction when the agent tried to move.
fn steer<R: Rng>(
    agent: &mut Agent,
    goal: Vec2,
    ctx: &TacticContext<'_>,
    dt: f32,
    rng: &mut R,
) -> Option<Vec2> {
    let config = ctx.config;
    agent.age_detour(dt);

    let waypoint = agent.detour().unwrap_or(goal);
    let delta = waypoint - agent.position;
    let remaining = delta.length();
    let mut travel_dir = None;

    if remaining > ARRIVAL_EPSILON {
        if let Some(dir) = delta.normalized() {
            travel_dir = Some(dir);
            let step = (agent.phenotype.stats.speed * dt).min(remaining);
            let next = config.clamp_to_bounds(agent.position + dir * step);

            if collides_with_obstacles(next, config.tank_size, ctx.obstacles) {
                let detour = avoid_obstacle(agent, goal, dir, step, config, ctx.obstacles);
                agent.set_detour(detour, config.stuck_window);
            } else {
                agent.position = next;
                release_avoidance(agent, goal);
            }
        }
    }

    if let Some(point) = agent.detour() {
        if agent.position.distance_to(point) <= ARRIVAL_EPSILON {
            agent.finish_detour();
        }
    }

    let stuck = agent.stuck.update(
        agent.position,
        dt,
        config.stuck_window,
        config.stuck_distance,
    );
    if stuck && agent.position.distance_to(goal) > config.stuck_distance {
        tracing::debug!("Agent {:?} stuck at {:?}, repathing", agent.id, agent.position);
        agent.avoidance = None;
        agent.set_detour(random_point(config, rng), config.stuck_window);
        agent.stats.repaths += 1;
    }

    travel_dir
}

/// Drop the held side once a clear step toward the goal has made progress
fn release_avoidance(agent: &mut Agent, goal: Vec2) {
    if agent.detour().is_some() {
        return;
    }
    if let Some(avoidance) = agent.avoidance {
        if agent.position.distance_to(goal) < avoidance.start_distance {
            agent.avoidance = None;
        }
    }
}

/// Next detour waypoint for a blocked step along `dir`.
///
/// Keeps to the held side while both its first step and its end point are
/// clear; otherwise picks a fresh side with [`side_step`] and holds that one.
fn avoid_obstacle(
    agent: &mut Agent,
    goal: Vec2,
    dir: Vec2,
    step: f32,
    config: &SimulationConfig,
    obstacles: &[Rect],
) -> Vec2 {
    let displacement = agent.position.distance_to(goal);
    let offset = detour_offset(displacement, config);

    if let Some(avoidance) = agent.avoidance {
        let first = config.clamp_to_bounds(agent.position + avoidance.side * step);
        let held = config.clamp_to_bounds(agent.position + avoidance.side * offset);
        let clear = |p: Vec2| !collides_with_obstacles(p, config.tank_size, obstacles);
        if held != agent.position && clear(first) && clear(held) {
            return held;
        }
    }

    let point = side_step(agent.position, goal, dir, displacement, config, obstacles);
    let start_distance = agent
        .avoidance
        .map_or(displacement, |a| a.start_distance);
    agent.avoidance = (point - agent.position)
        .normalized()
        .map(|side| Avoidance { side, start_distance });
    point
}

/// Side-step length: 0.1x the remaining displacement, never under a hull width
fn detour_offset(displacement: f32, config: &SimulationConfig) -> f32 {
    (0.1 * displacement).max(config.tank_size)
}

/// Perpendicular detour (±90° from travel) scaled by 0.1× the remaining
/// displacement. A side whose detour point is itself blocked loses; otherwise
/// the point closer to the goal wins, left on ties.
fn side_step(
    position: Vec2,
    goal: Vec2,
    dir: Vec2,
    displacement: f32,
    config: &SimulationConfig,
    obstacles: &[Rect],
) -> Vec2 {
    let offset = detour_offset(displacement, config);
    let perp = dir.perpendicular();
    let left = config.clamp_to_bounds(position + perp * offset);
    let right = config.clamp_to_bounds(position - perp * offset);

    let left_blocked = collides_with_obstacles(left, config.tank_size, obstacles);
    let right_blocked = collides_with_obstacles(right, config.tank_size, obstacles);
    match (left_blocked, right_blocked) {
        (false, true) => left,
        (true, false) => right,
        _ if right.distance_to(goal) < left.distance_to(goal) => right,
        _ => left,
    }
}
