//! Per-agent perception of the world snapshot
//!
//! Recomputed from scratch on every call: O(N) per agent, O(N^2) per tick.

use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentId, Team};
use crate::geometry::{has_line_of_sight, Rect, Vec2};
use crate::hill::Hill;

/// Frozen view of one agent taken at the start of a tick
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentView {
    pub id: AgentId,
    pub team: Team,
    pub position: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub alive: bool,
}

impl AgentView {
    pub fn of(agent: &Agent) -> Self {
        Self {
            id: agent.id,
            team: agent.team,
            position: agent.position,
            health: agent.health(),
            max_health: agent.max_health(),
            alive: agent.is_alive(),
        }
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            self.health / self.max_health
        }
    }
}

/// Another agent as seen by the observer
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    pub id: AgentId,
    pub position: Vec2,
    pub distance: f32,
    pub health_fraction: f32,
}

/// Objective state as seen by the observer
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveStatus {
    pub center: Vec2,
    pub radius: f32,
    pub distance: f32,
    pub controlling_team: Option<Team>,
    pub progress: f32,
}

impl ObjectiveStatus {
    /// Hill not controlled by `team`
    pub fn not_held_by(&self, team: Team) -> bool {
        self.controlling_team != Some(team)
    }
}

/// Result of a perception pass
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Perception {
    /// In range with clear line of sight, nearest first
    pub visible_enemies: Vec<Contact>,
    /// Live allies within range, nearest first
    pub nearby_allies: Vec<Contact>,
    pub objective: Option<ObjectiveStatus>,
}

impl Perception {
    pub fn nearest_enemy(&self) -> Option<&Contact> {
        self.visible_enemies.first()
    }

    pub fn enemy(&self, id: AgentId) -> Option<&Contact> {
        self.visible_enemies.iter().find(|c| c.id == id)
    }
}

/// Compute what `observer` can perceive from the world snapshot
pub fn perceive(
    observer: &Agent,
    world: &[AgentView],
    obstacles: &[Rect],
    hill: Option<&Hill>,
) -> Perception {
    let range = observer.phenotype.stats.range;
    let origin = observer.position;
    let mut perception = Perception::default();

    for other in world.iter().filter(|v| v.alive && v.id != observer.id) {
        let distance = origin.distance_to(other.position);
        if distance > range {
            continue;
        }
        let contact = Contact {
            id: other.id,
            position: other.position,
            distance,
            health_fraction: other.health_fraction(),
        };

        if other.team == observer.team {
            perception.nearby_allies.push(contact);
        } else if has_line_of_sight(origin, other.position, obstacles) {
            perception.visible_enemies.push(contact);
        }
    }

    let by_distance = |a: &Contact, b: &Contact| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(std::cmp::Ordering::Equal)
    };
    perception.visible_enemies.sort_by(by_distance);
    perception.nearby_allies.sort_by(by_distance);

    perception.objective = hill.map(|h| ObjectiveStatus {
        center: h.center(),
        radius: h.radius(),
        distance: origin.distance_to(h.center()),
        controlling_team: h.controlling_team(),
        progress: h.control_progress(),
    });

    perception
}

/// Nearest live ally anywhere on the field (ignores range)
pub fn nearest_ally(observer: &Agent, world: &[AgentView]) -> Option<Contact> {
    world
        .iter()
        .filter(|v| v.alive && v.id != observer.id && v.team == observer.team)
        .map(|v| Contact {
            id: v.id,
            position: v.position,
            distance: observer.position.distance_to(v.position),
            health_fraction: v.health_fraction(),
        })
        .min_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}
