//! Battle state and the per-tick simulation loop
//!
//! Tick order:
//! 1. snapshot every agent into an [`AgentView`] (nobody sees post-tick state)
//! 2. per live agent: perceive, decide/behave, move, fire
//! 3. advance projectiles; the nearest wall or enemy along each swept path
//!    stops it, before expiry is applied; credit shooters
//! 4. update the hill with fresh positions
//! 5. accrue survival/dwell time, advance the clock, check the win condition

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentId, AgentSnapshot, AgentStats, Team};
use crate::combat::{credit_hit, fire, should_fire, Projectile, ProjectileSnapshot};
use crate::config::SimulationConfig;
use crate::error::{SimError, SimResult};
use crate::genome::Genome;
use crate::geometry::{collides_with_obstacles, Rect, Vec2};
use crate::hill::{CaptureEvent, Hill, HillSnapshot};
use crate::perception::{perceive, AgentView};
use crate::tactics::{execute_movement, update_agent, TacticContext};

/// Spawn column as a fraction of battlefield width
const SPAWN_COLUMN: f32 = 0.1;
/// Attempts to nudge a spawn point clear of obstacles
const SPAWN_NUDGE_ATTEMPTS: usize = 8;

// ============================================================================
// OUTCOME
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleOutcome {
    Victory(Team),
    Draw,
}

impl BattleOutcome {
    pub fn winner(&self) -> Option<Team> {
        match self {
            BattleOutcome::Victory(team) => Some(*team),
            BattleOutcome::Draw => None,
        }
    }
}

/// Where and how one agent enters the battle
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spawn {
    pub team: Team,
    pub genome: Genome,
    pub position: Vec2,
    pub angle: f32,
}

// ============================================================================
// BATTLE STATE
// ============================================================================

/// Complete battle state. Agents live in an arena indexed by [`AgentId`]
/// and are never removed, so ids held by targets and projectiles stay valid.
#[derive(Clone, Debug)]
pub struct BattleState {
    pub config: SimulationConfig,
    agents: Vec<Agent>,
    projectiles: Vec<Projectile>,
    obstacles: Vec<Rect>,
    hill: Option<Hill>,
    time: f32,
    tick_count: u64,
    rng: ChaCha8Rng,
    outcome: Option<BattleOutcome>,
}

/// Build a battle with team A on the left facing right and team B on the
/// right facing left, each spread evenly down its spawn column.
pub fn initialize_battle(
    genomes_a: &[Genome],
    genomes_b: &[Genome],
    obstacles: Vec<Rect>,
    config: SimulationConfig,
) -> SimResult<BattleState> {
    config.validate()?;

    let mut spawns = Vec::with_capacity(genomes_a.len() + genomes_b.len());
    for (team, genomes) in [(Team::A, genomes_a), (Team::B, genomes_b)] {
        let (x, angle) = match team {
            Team::A => (config.width * SPAWN_COLUMN, 0.0),
            Team::B => (config.width * (1.0 - SPAWN_COLUMN), std::f32::consts::PI),
        };
        let n = genomes.len();
        for (i, genome) in genomes.iter().enumerate() {
            let y = config.height * (i + 1) as f32 / (n + 1) as f32;
            let position = clear_spawn(Vec2::new(x, y), &obstacles, &config);
            spawns.push(Spawn {
                team,
                genome: *genome,
                position,
                angle,
            });
        }
    }

    let state = BattleState::with_spawns(&spawns, obstacles, config)?;
    tracing::debug!(
        "Battle initialized: {} vs {} agents, {} obstacles, hill={}",
        genomes_a.len(),
        genomes_b.len(),
        state.obstacles.len(),
        state.hill.is_some()
    );
    Ok(state)
}

/// Slide a spawn point vertically until its hitbox is clear of obstacles.
/// Falls back to the original point when no clear slot is found.
fn clear_spawn(base: Vec2, obstacles: &[Rect], config: &SimulationConfig) -> Vec2 {
    if !collides_with_obstacles(base, config.tank_size, obstacles) {
        return base;
    }
    for step in 1..=SPAWN_NUDGE_ATTEMPTS {
        let offset = config.tank_size * step as f32;
        for candidate in [base + Vec2::new(0.0, offset), base - Vec2::new(0.0, offset)] {
            let candidate = config.clamp_to_bounds(candidate);
            if !collides_with_obstacles(candidate, config.tank_size, obstacles) {
                return candidate;
            }
        }
    }
    base
}

impl BattleState {
    /// Build a battle from explicit spawns. Agent ids follow spawn order.
    pub fn with_spawns(
        spawns: &[Spawn],
        obstacles: Vec<Rect>,
        config: SimulationConfig,
    ) -> SimResult<Self> {
        config.validate()?;

        let agents = spawns
            .iter()
            .enumerate()
            .map(|(i, s)| Agent::new(AgentId(i), s.team, s.genome, s.position, s.angle, &config))
            .collect();

        let hill = config.objective.as_ref().map(|obj| {
            let center = obj.position.unwrap_or_else(|| config.center());
            Hill::new(center, obj.clone())
        });

        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            agents,
            projectiles: Vec::new(),
            obstacles,
            hill,
            time: 0.0,
            tick_count: 0,
            outcome: None,
        })
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, id: AgentId) -> SimResult<&Agent> {
        self.agents.get(id.0).ok_or(SimError::UnknownAgent(id))
    }

    pub fn agent_mut(&mut self, id: AgentId) -> SimResult<&mut Agent> {
        self.agents.get_mut(id.0).ok_or(SimError::UnknownAgent(id))
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn obstacles(&self) -> &[Rect] {
        &self.obstacles
    }

    pub fn hill(&self) -> Option<&Hill> {
        self.hill.as_ref()
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn alive_count(&self, team: Team) -> usize {
        self.agents.iter().filter(|a| a.team == team && a.is_alive()).count()
    }

    /// Sum of remaining health across a team's live agents
    pub fn total_health(&self, team: Team) -> f32 {
        self.agents
            .iter()
            .filter(|a| a.team == team && a.is_alive())
            .map(|a| a.health())
            .sum()
    }

    // ========================================================================
    // TICK
    // ========================================================================

    /// Advance the simulation by `dt` seconds.
    ///
    /// # Errors
    /// [`SimError::BattleOver`] if the battle already has an outcome,
    /// [`SimError::InvalidConfig`] if `dt` is not a positive finite step.
    pub fn tick(&mut self, dt: f32) -> SimResult<()> {
        if self.outcome.is_some() {
            return Err(SimError::BattleOver);
        }
        if !(dt.is_finite() && dt > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "tick step must be positive and finite, got {}",
                dt
            )));
        }

        let world: Vec<AgentView> = self.agents.iter().map(AgentView::of).collect();
        self.update_agents(&world, dt);
        self.update_projectiles(dt);

        if let Some(hill) = self.hill.as_mut() {
            let fresh: Vec<AgentView> = self.agents.iter().map(AgentView::of).collect();
            hill.update(dt, self.time, &fresh);
        }

        for agent in &mut self.agents {
            agent.accrue_time(dt);
        }
        self.time += dt;
        self.tick_count += 1;

        self.outcome = self.check_win_condition();
        if let Some(outcome) = self.outcome {
            tracing::debug!(
                "Battle over after {} ticks ({:.1}s): {:?}",
                self.tick_count,
                self.time,
                outcome
            );
        }
        Ok(())
    }

    fn update_agents(&mut self, world: &[AgentView], dt: f32) {
        let ctx = TacticContext {
            config: &self.config,
            obstacles: &self.obstacles,
            world,
        };

        for i in 0..self.agents.len() {
            let agent = &mut self.agents[i];
            if !agent.is_alive() {
                continue;
            }

            let perception = perceive(agent, world, ctx.obstacles, self.hill.as_ref());
            let aim = update_agent(agent, &perception, &ctx, dt, &mut self.rng);
            execute_movement(agent, aim, &ctx, dt, &mut self.rng);

            let Some(target) = agent.target().and_then(|id| world.get(id.0)) else {
                continue;
            };
            if should_fire(agent, target, ctx.obstacles) {
                if let Some(p) = fire(agent, self.time, ctx.config, &mut self.rng) {
                    self.projectiles.push(p);
                }
            }
        }
    }

    fn update_projectiles(&mut self, dt: f32) {
        let tank_size = self.config.tank_size;
        let by_fraction = |a: &(f32, AgentId), b: &(f32, AgentId)| {
            a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal)
        };

        for p in &mut self.projectiles {
            if p.is_removed() {
                continue;
            }
            let previous = p.update(dt, &self.config);

            // Whatever the swept path meets first stops it: a wall or an enemy hitbox
            let wall = self
                .obstacles
                .iter()
                .filter_map(|r| p.swept_entry(previous, r))
                .fold(None, |nearest: Option<f32>, t| Some(nearest.map_or(t, |n| n.min(t))));
            let victim = self
                .agents
                .iter()
                .filter(|a| a.is_alive() && a.team != p.team)
                .filter_map(|a| p.swept_entry(previous, &a.hitbox(tank_size)).map(|t| (t, a.id)))
                .min_by(by_fraction);

            let victim = match (victim, wall) {
                (Some((t, id)), Some(w)) if t <= w => id,
                (Some((_, id)), None) => id,
                (_, Some(_)) => {
                    p.remove();
                    continue;
                }
                (None, None) => continue,
            };
            let Some(report) = p.hit(&mut self.agents[victim.0]) else {
                continue;
            };
            if let Some(shooter) = self.agents.get_mut(report.shooter.0) {
                credit_hit(shooter, &report);
            }
            if report.killed {
                tracing::trace!(
                    "Agent {:?} destroyed by {:?} at t={:.2}",
                    report.target,
                    report.shooter,
                    self.time
                );
            }
        }

        self.projectiles.retain(|p| !p.is_removed());
    }

    // ========================================================================
    // WIN CONDITIONS
    // ========================================================================

    /// Hill victory first, then elimination. `None` while the battle runs.
    pub fn check_win_condition(&self) -> Option<BattleOutcome> {
        if let Some(team) = self.hill.as_ref().and_then(Hill::winner) {
            return Some(BattleOutcome::Victory(team));
        }

        match (self.alive_count(Team::A), self.alive_count(Team::B)) {
            (0, 0) => Some(BattleOutcome::Draw),
            (0, _) => Some(BattleOutcome::Victory(Team::B)),
            (_, 0) => Some(BattleOutcome::Victory(Team::A)),
            _ => None,
        }
    }

    /// Close a battle that ran out of time.
    ///
    /// Ranks teams by hill score (objective mode), then live agents, then
    /// remaining total health. An exact tie is a draw. Returns the existing
    /// outcome if the battle already ended.
    pub fn end_by_time_limit(&mut self) -> BattleOutcome {
        if let Some(outcome) = self.outcome {
            return outcome;
        }

        let [a, b] = Team::ALL.map(|team| {
            let hill_score = self.hill.as_ref().map_or(0.0, |h| h.score(team));
            (hill_score, self.alive_count(team) as f32, self.total_health(team))
        });
        let outcome = match a.partial_cmp(&b) {
            Some(std::cmp::Ordering::Greater) => BattleOutcome::Victory(Team::A),
            Some(std::cmp::Ordering::Less) => BattleOutcome::Victory(Team::B),
            _ => BattleOutcome::Draw,
        };

        tracing::debug!("Battle hit time limit at {:.1}s: {:?}", self.time, outcome);
        self.outcome = Some(outcome);
        outcome
    }

    // ========================================================================
    // SNAPSHOTS
    // ========================================================================

    pub fn snapshot(&self) -> BattleSnapshot {
        BattleSnapshot {
            time: self.time,
            tick: self.tick_count,
            agents: self.agents.iter().map(Agent::snapshot).collect(),
            projectiles: self.projectiles.iter().map(Projectile::snapshot).collect(),
            hill: self.hill.as_ref().map(Hill::snapshot),
            outcome: self.outcome,
        }
    }

    /// End-of-battle summary. Valid at any point; `outcome` is `None` while
    /// the battle is still running.
    pub fn result(&self) -> BattleResult {
        let mut slots = [0usize; 2];
        let agents = self
            .agents
            .iter()
            .map(|a| {
                let slot = &mut slots[a.team.index()];
                let result = AgentResult {
                    id: a.id,
                    team: a.team,
                    slot: *slot,
                    genome: *a.genome(),
                    fitness: a.calculate_fitness(),
                    alive: a.is_alive(),
                    stats: a.stats.clone(),
                };
                *slot += 1;
                result
            })
            .collect();

        BattleResult {
            outcome: self.outcome,
            duration: self.time,
            ticks: self.tick_count,
            team_stats: Team::ALL.iter().map(|&t| self.team_stats(t)).collect(),
            agents,
            hill: self.hill.as_ref().map(Hill::snapshot),
            capture_events: self
                .hill
                .as_ref()
                .map(|h| h.events().to_vec())
                .unwrap_or_default(),
        }
    }

    fn team_stats(&self, team: Team) -> TeamStats {
        let mut stats = TeamStats {
            team,
            agents: 0,
            alive: 0,
            total_health: 0.0,
            kills: 0,
            shots_fired: 0,
            shots_hit: 0,
            damage_dealt: 0.0,
            damage_taken: 0.0,
            hill_score: self.hill.as_ref().map_or(0.0, |h| h.score(team)),
        };
        for a in self.agents.iter().filter(|a| a.team == team) {
            stats.agents += 1;
            if a.is_alive() {
                stats.alive += 1;
                stats.total_health += a.health();
            }
            stats.kills += a.stats.kills;
            stats.shots_fired += a.stats.shots_fired;
            stats.shots_hit += a.stats.shots_hit;
            stats.damage_dealt += a.stats.damage_dealt;
            stats.damage_taken += a.stats.damage_taken;
        }
        stats
    }
}

// ============================================================================
// RESULTS
// ============================================================================

/// Read-only view of the whole battle
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BattleSnapshot {
    pub time: f32,
    pub tick: u64,
    pub agents: Vec<AgentSnapshot>,
    pub projectiles: Vec<ProjectileSnapshot>,
    pub hill: Option<HillSnapshot>,
    pub outcome: Option<BattleOutcome>,
}

/// Per-team totals at battle end
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TeamStats {
    pub team: Team,
    pub agents: usize,
    pub alive: usize,
    pub total_health: f32,
    pub kills: u32,
    pub shots_fired: u32,
    pub shots_hit: u32,
    pub damage_dealt: f32,
    pub damage_taken: f32,
    pub hill_score: f32,
}

/// One agent's contribution, for feeding fitness back to the pool
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    pub id: AgentId,
    pub team: Team,
    /// Position within its team's genome list
    pub slot: usize,
    pub genome: Genome,
    pub fitness: f32,
    pub alive: bool,
    pub stats: AgentStats,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BattleResult {
    pub outcome: Option<BattleOutcome>,
    pub duration: f32,
    pub ticks: u64,
    pub team_stats: Vec<TeamStats>,
    pub agents: Vec<AgentResult>,
    pub hill: Option<HillSnapshot>,
    pub capture_events: Vec<CaptureEvent>,
}

impl BattleResult {
    pub fn winner(&self) -> Option<Team> {
        self.outcome.and_then(|o| o.winner())
    }

    pub fn team(&self, team: Team) -> Option<&TeamStats> {
        self.team_stats.iter().find(|s| s.team == team)
    }

    /// Agents of one team, in slot order
    pub fn team_agents(&self, team: Team) -> impl Iterator<Item = &AgentResult> {
        self.agents.iter().filter(move |a| a.team == team)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ObjectiveConfig;
    use crate::tactics::TacticalState;

    const DT: f32 = 0.1;

    fn duel(a: Vec2, b: Vec2) -> BattleState {
        let spawns = [
            Spawn { team: Team::A, genome: Genome::default(), position: a, angle: 0.0 },
            Spawn { team: Team::B, genome: Genome::default(), position: b, angle: std::f32::consts::PI },
        ];
        BattleState::with_spawns(&spawns, Vec::new(), SimulationConfig::default()).unwrap()
    }

    #[test]
    fn test_neutral_duel_first_tick() {
        let mut battle = duel(Vec2::new(100.0, 300.0), Vec2::new(150.0, 300.0));
        battle.tick(DT).unwrap();

        let a = battle.agent(AgentId(0)).unwrap();
        let b = battle.agent(AgentId(1)).unwrap();
        assert_eq!(a.stats.shots_fired, 1);
        assert_eq!(a.target(), Some(AgentId(1)));
        assert_eq!(b.target(), Some(AgentId(0)));
        assert_eq!(a.state(), TacticalState::Attack);
    }

    #[test]
    fn test_spawn_layout() {
        let genomes = vec![Genome::default(); 3];
        let battle = initialize_battle(&genomes, &genomes, Vec::new(), SimulationConfig::default()).unwrap();

        assert_eq!(battle.agents().len(), 6);
        for a in battle.agents() {
            match a.team {
                Team::A => assert!((a.position.x - 100.0).abs() < 1e-3 && a.angle == 0.0),
                Team::B => assert!((a.position.x - 900.0).abs() < 1e-3),
            }
        }
        assert_eq!(battle.agents()[0].id, AgentId(0));
        assert_eq!(battle.agents()[3].team, Team::B);
        assert!(battle.hill().is_none());
    }

    #[test]
    fn test_spawn_avoids_obstacles() {
        let config = SimulationConfig::default();
        // Covers the single A spawn at (100, 350)
        let wall = Rect::new(80.0, 330.0, 40.0, 40.0);
        let battle = initialize_battle(&[Genome::default()], &[], vec![wall], config.clone()).unwrap();
        let a = &battle.agents()[0];
        assert!(!collides_with_obstacles(a.position, config.tank_size, &[wall]));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = SimulationConfig::default();
        config.width = 0.0;
        let err = initialize_battle(&[], &[], Vec::new(), config).unwrap_err();
        assert!(matches!(err, SimError::InvalidConfig(_)));
    }

    #[test]
    fn test_unknown_agent() {
        let battle = duel(Vec2::new(100.0, 300.0), Vec2::new(150.0, 300.0));
        assert!(matches!(battle.agent(AgentId(9)), Err(SimError::UnknownAgent(AgentId(9)))));
    }

    #[test]
    fn test_elimination_ends_battle() {
        let mut battle = duel(Vec2::new(100.0, 300.0), Vec2::new(150.0, 300.0));
        battle.agent_mut(AgentId(1)).unwrap().take_damage(1_000.0);
        assert_eq!(battle.check_win_condition(), Some(BattleOutcome::Victory(Team::A)));

        battle.tick(DT).unwrap();
        assert_eq!(battle.outcome(), Some(BattleOutcome::Victory(Team::A)));
        assert!(matches!(battle.tick(DT), Err(SimError::BattleOver)));
    }

    #[test]
    fn test_duel_runs_to_completion() {
        let mut battle = duel(Vec2::new(100.0, 300.0), Vec2::new(150.0, 300.0));
        for _ in 0..3_000 {
            if battle.is_over() {
                break;
            }
            battle.tick(DT).unwrap();
        }
        let outcome = battle.outcome().unwrap_or_else(|| battle.end_by_time_limit());

        let result = battle.result();
        assert_eq!(result.outcome, Some(outcome));
        let shots: u32 = result.team_stats.iter().map(|s| s.shots_fired).sum();
        let hits: u32 = result.team_stats.iter().map(|s| s.shots_hit).sum();
        assert!(shots > 0);
        assert!(hits <= shots);
        for a in &result.agents {
            assert!(a.fitness.is_finite());
        }
    }

    #[test]
    fn test_identical_seed_reproduces_battle() {
        let run = || {
            let genomes_a = vec![Genome::uniform(0.8); 3];
            let genomes_b = vec![Genome::uniform(0.3); 3];
            let mut battle =
                initialize_battle(&genomes_a, &genomes_b, Vec::new(), SimulationConfig::default()).unwrap();
            for _ in 0..400 {
                if battle.is_over() {
                    break;
                }
                battle.tick(DT).unwrap();
            }
            battle.snapshot()
        };
        let first = run();
        let second = run();
        assert_eq!(first.tick, second.tick);
        assert_eq!(first.agents, second.agents);
    }

    #[test]
    fn test_time_limit_prefers_hill_score_then_alive() {
        let config = SimulationConfig::default().with_objective(ObjectiveConfig::default());
        let spawns = [
            Spawn { team: Team::A, genome: Genome::default(), position: Vec2::new(500.0, 350.0), angle: 0.0 },
            Spawn { team: Team::B, genome: Genome::default(), position: Vec2::new(950.0, 50.0), angle: 0.0 },
            Spawn { team: Team::B, genome: Genome::default(), position: Vec2::new(950.0, 650.0), angle: 0.0 },
        ];
        let mut battle = BattleState::with_spawns(&spawns, Vec::new(), config).unwrap();
        for _ in 0..45 {
            battle.tick(DT).unwrap();
        }
        // A held the hill alone long enough to score, B has more tanks
        assert!(battle.hill().unwrap().score(Team::A) > 0.0);
        assert_eq!(battle.alive_count(Team::B), 2);
        assert_eq!(battle.end_by_time_limit(), BattleOutcome::Victory(Team::A));
    }

    #[test]
    fn test_time_limit_alive_count_without_hill() {
        let spawns = [
            Spawn { team: Team::A, genome: Genome::default(), position: Vec2::new(100.0, 100.0), angle: 0.0 },
            Spawn { team: Team::B, genome: Genome::default(), position: Vec2::new(900.0, 600.0), angle: 0.0 },
            Spawn { team: Team::B, genome: Genome::default(), position: Vec2::new(900.0, 100.0), angle: 0.0 },
        ];
        let mut battle = BattleState::with_spawns(&spawns, Vec::new(), SimulationConfig::default()).unwrap();
        assert_eq!(battle.end_by_time_limit(), BattleOutcome::Victory(Team::B));
        // Repeated calls keep the first resolution
        assert_eq!(battle.end_by_time_limit(), BattleOutcome::Victory(Team::B));
    }

    #[test]
    fn test_time_limit_exact_tie_is_draw() {
        let mut battle = duel(Vec2::new(100.0, 100.0), Vec2::new(900.0, 600.0));
        assert_eq!(battle.end_by_time_limit(), BattleOutcome::Draw);
    }

    #[test]
    fn test_result_slots_follow_team_order() {
        let genomes = vec![Genome::default(); 2];
        let battle = initialize_battle(&genomes, &genomes, Vec::new(), SimulationConfig::default()).unwrap();
        let result = battle.result();
        let slots: Vec<usize> = result.team_agents(Team::B).map(|a| a.slot).collect();
        assert_eq!(slots, vec![0, 1]);
        assert_eq!(result.team(Team::A).map(|s| s.alive), Some(2));
    }

    #[test]
    fn test_rejects_non_positive_step() {
        let mut battle = duel(Vec2::new(100.0, 300.0), Vec2::new(900.0, 300.0));
        for dt in [0.0, -0.1, f32::NAN, f32::INFINITY] {
            assert!(matches!(battle.tick(dt), Err(SimError::InvalidConfig(_))));
        }
        assert_eq!(battle.tick_count(), 0);
        assert!(battle.tick(DT).is_ok());
    }

    /// Team B walled into the bottom-right corner: it cannot move, see or be seen
    fn boxed_spawn() -> (Spawn, [Rect; 2]) {
        let spawn = Spawn {
            team: Team::B,
            genome: Genome::default(),
            position: Vec2::new(985.0, 685.0),
            angle: 0.0,
        };
        let pocket = [Rect::new(960.0, 660.0, 40.0, 9.0), Rect::new(960.0, 660.0, 9.0, 40.0)];
        (spawn, pocket)
    }

    #[test]
    fn test_seek_hill_works_around_wall() {
        let config = SimulationConfig::default().with_objective(ObjectiveConfig {
            radius: 80.0,
            contest_radius: 120.0,
            ..ObjectiveConfig::default()
        });
        let (boxed, pocket) = boxed_spawn();
        let spawns = [
            Spawn { team: Team::A, genome: Genome::default(), position: Vec2::new(400.0, 350.0), angle: 0.0 },
            boxed,
        ];
        let mut obstacles = pocket.to_vec();
        // Flat wall straight across the approach to the hill at (500, 350)
        obstacles.push(Rect::new(430.0, 300.0, 20.0, 100.0));
        let mut battle = BattleState::with_spawns(&spawns, obstacles, config).unwrap();
        let center = Vec2::new(500.0, 350.0);

        let mut reached = false;
        for _ in 0..600 {
            battle.tick(0.05).unwrap();
            let a = battle.agent(AgentId(0)).unwrap();
            if a.position.distance_to(center) <= 80.0 {
                reached = true;
                break;
            }
        }
        assert!(reached);
        assert_eq!(battle.hill().and_then(|h| h.controlling_team()), Some(Team::A));
    }

    #[test]
    fn test_boxed_agent_repaths() {
        let (boxed, pocket) = boxed_spawn();
        let spawns = [
            Spawn { team: Team::A, genome: Genome::default(), position: Vec2::new(100.0, 100.0), angle: 0.0 },
            boxed,
        ];
        let mut battle = BattleState::with_spawns(&spawns, pocket.to_vec(), SimulationConfig::default()).unwrap();

        for _ in 0..80 {
            battle.tick(0.05).unwrap();
        }
        let b = battle.agent(AgentId(1)).unwrap();
        assert!(b.stats.repaths >= 1);
        assert!(b.position.distance_to(Vec2::new(985.0, 685.0)) < 2.0);
    }

    #[test]
    fn test_projectile_hits_enemy_before_wall_and_expiry() {
        let spawns = [
            Spawn { team: Team::A, genome: Genome::default(), position: Vec2::new(100.0, 100.0), angle: 0.0 },
            Spawn { team: Team::B, genome: Genome::default(), position: Vec2::new(600.0, 600.0), angle: 0.0 },
        ];
        let wall = Rect::new(650.0, 550.0, 20.0, 100.0);
        let mut battle = BattleState::with_spawns(&spawns, vec![wall], SimulationConfig::default()).unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut gun = Agent::new(AgentId(0), Team::A, Genome::default(), Vec2::new(560.0, 600.0), 0.0, &battle.config);
        let mut shot = fire(&mut gun, 0.0, &battle.config, &mut rng).unwrap();
        // One step crosses B, then the wall, and outlives its lifetime
        shot.position = Vec2::new(560.0, 600.0);
        shot.velocity = Vec2::new(3000.0, 0.0);
        shot.remaining = 0.01;
        battle.projectiles.push(shot);

        battle.tick(0.05).unwrap();
        let b = battle.agent(AgentId(1)).unwrap();
        assert!(b.health() < b.max_health());
        assert_eq!(battle.agent(AgentId(0)).unwrap().stats.shots_hit, 1);
        assert!(battle.projectiles().is_empty());
    }

    #[test]
    fn test_wall_in_front_stops_projectile() {
        let spawns = [
            Spawn { team: Team::A, genome: Genome::default(), position: Vec2::new(100.0, 100.0), angle: 0.0 },
            Spawn { team: Team::B, genome: Genome::default(), position: Vec2::new(700.0, 600.0), angle: 0.0 },
        ];
        let wall = Rect::new(620.0, 550.0, 20.0, 100.0);
        let mut battle = BattleState::with_spawns(&spawns, vec![wall], SimulationConfig::default()).unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut gun = Agent::new(AgentId(0), Team::A, Genome::default(), Vec2::new(560.0, 600.0), 0.0, &battle.config);
        let mut shot = fire(&mut gun, 0.0, &battle.config, &mut rng).unwrap();
        shot.position = Vec2::new(560.0, 600.0);
        shot.velocity = Vec2::new(3000.0, 0.0);
        battle.projectiles.push(shot);

        battle.tick(0.05).unwrap();
        let b = battle.agent(AgentId(1)).unwrap();
        assert_eq!(b.health(), b.max_health());
        assert!(battle.projectiles().is_empty());
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut battle = duel(Vec2::new(100.0, 300.0), Vec2::new(150.0, 300.0));
        battle.tick(DT).unwrap();
        let json = serde_json::to_string(&battle.snapshot()).unwrap();
        assert!(json.contains("\"agents\""));
    }
}
