//! Link-rule propagation and the puzzle completion/lock state machine.

use std::time::Duration;

use gloamwell_core::{CompletionMode, Event, LightId, ObstacleId};

use crate::{
    lights::{self, Light},
    Obstacle,
};

/// One-way propagation rule from a source light to a target light.
#[derive(Clone, Debug)]
pub(crate) struct LinkRule {
    pub(crate) source: LightId,
    pub(crate) target: LightId,
    invert: bool,
    delay: Duration,
    last_observed: bool,
    pending: Option<Duration>,
}

impl LinkRule {
    pub(crate) const fn new(
        source: LightId,
        target: LightId,
        invert: bool,
        delay: Duration,
        source_initially_on: bool,
    ) -> Self {
        Self {
            source,
            target,
            invert,
            delay,
            last_observed: source_initially_on,
            pending: None,
        }
    }
}

/// Lock/unlock state machine layered over a set of link rules.
#[derive(Clone, Debug)]
pub(crate) struct Puzzle {
    mode: CompletionMode,
    lock_on_completion: bool,
    force_sources_on_lock: bool,
    disable_lifetimes_on_lock: bool,
    open_obstacles_on_completion: bool,
    pub(crate) obstacles: Vec<ObstacleId>,
    completed: bool,
    locked: bool,
    primed: bool,
}

impl Puzzle {
    pub(crate) const fn new(
        mode: CompletionMode,
        lock_on_completion: bool,
        force_sources_on_lock: bool,
        disable_lifetimes_on_lock: bool,
        open_obstacles_on_completion: bool,
        obstacles: Vec<ObstacleId>,
    ) -> Self {
        Self {
            mode,
            lock_on_completion,
            force_sources_on_lock,
            disable_lifetimes_on_lock,
            open_obstacles_on_completion,
            obstacles,
            completed: false,
            locked: false,
            primed: false,
        }
    }

    pub(crate) const fn completed(&self) -> bool {
        self.completed
    }

    pub(crate) const fn locked(&self) -> bool {
        self.locked
    }

    pub(crate) const fn mode(&self) -> CompletionMode {
        self.mode
    }
}

/// Runs one puzzle tick: the edge-detection pass, the delay-expiry pass, and
/// the completion recomputation. Skipped entirely while the puzzle is locked,
/// freezing pending delays along with rule evaluation.
pub(crate) fn step(
    puzzle: &mut Puzzle,
    rules: &mut [LinkRule],
    lights: &mut [Light],
    obstacles: &mut [Obstacle],
    dt: Duration,
    out_events: &mut Vec<Event>,
) {
    if puzzle.locked {
        return;
    }

    let mut edge_seen = false;

    // Pass one: observe source edges. A new edge supersedes any pending
    // delayed application (last-edge-wins).
    for rule in rules.iter_mut() {
        let Some(source_on) = lights::state_of(lights, rule.source) else {
            continue;
        };
        if source_on == rule.last_observed {
            continue;
        }
        rule.last_observed = source_on;
        edge_seen = true;
        tracing::debug!(
            source = rule.source.get(),
            is_on = source_on,
            "link source changed"
        );
        if rule.delay.is_zero() {
            apply_rule(rule.source, rule.target, rule.invert, lights, out_events);
        } else {
            rule.pending = Some(rule.delay);
        }
    }

    // Pass two: count down pending applications, applying with the source
    // state as it stands at expiry time.
    for rule in rules.iter_mut() {
        let Some(pending) = rule.pending else {
            continue;
        };
        let rest = pending.saturating_sub(dt);
        if rest.is_zero() {
            rule.pending = None;
            apply_rule(rule.source, rule.target, rule.invert, lights, out_events);
        } else {
            rule.pending = Some(rest);
        }
    }

    // The first tick also recomputes so levels that start with lit sources
    // are honored without waiting for an edge.
    if edge_seen || !puzzle.primed {
        puzzle.primed = true;
        recompute_completion(puzzle, rules, lights, obstacles, out_events);
    }
}

fn apply_rule(
    source: LightId,
    target: LightId,
    invert: bool,
    lights: &mut [Light],
    out_events: &mut Vec<Event>,
) {
    let Some(source_on) = lights::state_of(lights, source) else {
        return;
    };
    let _ = lights::drive(lights, target, source_on != invert, out_events);
}

fn recompute_completion(
    puzzle: &mut Puzzle,
    rules: &[LinkRule],
    lights: &mut [Light],
    obstacles: &mut [Obstacle],
    out_events: &mut Vec<Event>,
) {
    let satisfied = predicate_satisfied(puzzle.mode, rules, lights);

    if satisfied && !puzzle.completed {
        puzzle.completed = true;
        tracing::debug!("puzzle completed");
        out_events.push(Event::PuzzleCompleted);

        if puzzle.lock_on_completion {
            lock(puzzle, rules, lights, out_events);
        }
        if puzzle.open_obstacles_on_completion {
            open_well(puzzle, obstacles, out_events);
        }
    } else if !satisfied && puzzle.completed && !puzzle.locked {
        puzzle.completed = false;
        tracing::debug!("puzzle reset");
        out_events.push(Event::PuzzleReset);
    }
}

fn predicate_satisfied(mode: CompletionMode, rules: &[LinkRule], lights: &[Light]) -> bool {
    match mode {
        CompletionMode::AllLit => rules
            .iter()
            .all(|rule| lights::state_of(lights, rule.source).unwrap_or(false)),
        CompletionMode::AnyLit => rules
            .iter()
            .any(|rule| lights::state_of(lights, rule.source).unwrap_or(false)),
    }
}

fn lock(puzzle: &mut Puzzle, rules: &[LinkRule], lights: &mut [Light], out_events: &mut Vec<Event>) {
    puzzle.locked = true;
    tracing::debug!("puzzle locked");
    out_events.push(Event::PuzzleLocked);

    for rule in rules {
        if puzzle.force_sources_on_lock {
            let _ = lights::drive(lights, rule.source, true, out_events);
        }
        if puzzle.disable_lifetimes_on_lock {
            if let Some(light) = lights.iter_mut().find(|light| light.id == rule.source) {
                light.lifetime.disable();
            }
        }
    }
}

fn open_well(puzzle: &Puzzle, obstacles: &mut [Obstacle], out_events: &mut Vec<Event>) {
    for id in &puzzle.obstacles {
        set_obstacle(obstacles, *id, false, out_events);
    }
    tracing::debug!("well opened");
    out_events.push(Event::WellOpened);
}

/// Forces every rule light off and restores the blocking obstacles. Refused
/// while locked. The completed flag clears through normal recomputation on
/// the next tick.
pub(crate) fn reset(
    puzzle: &Puzzle,
    rules: &[LinkRule],
    lights: &mut [Light],
    obstacles: &mut [Obstacle],
    out_events: &mut Vec<Event>,
) {
    if puzzle.locked {
        tracing::debug!("reset refused: puzzle is locked");
        out_events.push(Event::PuzzleResetRefused);
        return;
    }

    for rule in rules {
        let _ = lights::drive(lights, rule.source, false, out_events);
        let _ = lights::drive(lights, rule.target, false, out_events);
    }

    if puzzle.open_obstacles_on_completion {
        for id in &puzzle.obstacles {
            set_obstacle(obstacles, *id, true, out_events);
        }
    }
}

/// Forces every rule source on; targets follow through normal rule
/// evaluation on the next tick, never synchronously.
pub(crate) fn complete(rules: &[LinkRule], lights: &mut [Light], out_events: &mut Vec<Event>) {
    for rule in rules {
        let _ = lights::drive(lights, rule.source, true, out_events);
    }
}

/// Clears the lock only: completion and obstacle state are untouched, and
/// rule evaluation resumes on the next tick.
pub(crate) fn unlock(puzzle: &mut Puzzle, out_events: &mut Vec<Event>) {
    if puzzle.locked {
        puzzle.locked = false;
        tracing::debug!("puzzle unlocked");
        out_events.push(Event::PuzzleUnlocked);
    }
}

fn set_obstacle(
    obstacles: &mut [Obstacle],
    id: ObstacleId,
    enabled: bool,
    out_events: &mut Vec<Event>,
) {
    let Some(obstacle) = obstacles.iter_mut().find(|obstacle| obstacle.id == id) else {
        return;
    };
    if obstacle.enabled != enabled {
        obstacle.enabled = enabled;
        out_events.push(Event::ObstacleToggled {
            obstacle: id,
            enabled,
        });
    }
}
