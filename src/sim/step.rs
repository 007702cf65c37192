/// The step function: advances the session by one tick.
///
/// Processing order:
///   1. Gate: only while Playing with a level loaded, and unpaused
///      unless the tick is forced (manual single step)
///   2. Movement resolution against the pre-tick snapshot (rules::resolve)
///   3. Commit all provisional positions at once
///   4. Outcome → GameEvent mapping
///   5. Completion check (LevelSolved on the transition only)
///
/// Everything else here changes which level is active: loading is atomic,
/// so a level that fails to parse leaves the current one untouched.

use crate::domain::entity::{ActorId, Direction, Pos};
use crate::domain::rules::{self, Outcome, StopCause};
use crate::sim::level::{parse_level, LevelError};
use super::event::GameEvent;
use super::world::{Phase, WorldState};

/// Per-actor state after a committed tick.
#[allow(dead_code)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActorStatus {
    pub id: ActorId,
    pub pos: Pos,
    pub direction: Option<Direction>,
    pub finished: bool,
}

/// What one tick did.
#[allow(dead_code)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub actors: Vec<ActorStatus>,
    pub events: Vec<GameEvent>,
}

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

/// Run one tick. Returns `None` when the session is not ticking.
///
/// The tick counter only advances when something happened, so an idle
/// board does not run up the HUD counter.
pub fn step(world: &mut WorldState, forced: bool) -> Option<TickReport> {
    if world.phase != Phase::Playing || !world.loaded {
        return None;
    }
    if world.paused && !forced {
        return None;
    }

    let was_complete = world.is_level_complete();
    let resolution = rules::resolve(&world.grid, &world.actors);
    world.actors = resolution.actors;
    rules::commit(&mut world.actors);

    if !resolution.outcomes.is_empty() {
        world.tick += 1;
    }

    let mut events: Vec<GameEvent> = resolution.outcomes.iter()
        .map(|o| to_event(world, o))
        .collect();

    if !was_complete && world.is_level_complete() {
        tracing::info!(level = world.current_level, ticks = world.tick, "level solved");
        events.push(GameEvent::LevelSolved);
    }

    tracing::trace!(tick = world.tick, events = events.len(), forced, "tick committed");

    Some(TickReport {
        tick: world.tick,
        actors: world.actors.iter()
            .map(|a| ActorStatus {
                id: a.id,
                pos: a.pos(),
                direction: a.direction,
                finished: a.finished,
            })
            .collect(),
        events,
    })
}

fn to_event(world: &WorldState, outcome: &Outcome) -> GameEvent {
    match *outcome {
        Outcome::Moved { actor, from, to } => GameEvent::ActorMoved { id: actor, from, to },
        Outcome::Stopped { actor, at, cause } => {
            match cause {
                StopCause::Wall => {}
                StopCause::Actor(other) => tracing::debug!(%actor, blocker = %other, "blocked by actor"),
                StopCause::Contested => tracing::debug!(%actor, "contested cell"),
            }
            GameEvent::ActorBlocked { id: actor, at }
        }
        Outcome::Pushed { pusher, pushed, direction } => {
            tracing::debug!(%pusher, %pushed, ?direction, "box pushed");
            GameEvent::BoxPushed { by: pusher, pushed, direction }
        }
        Outcome::ReachedGoal { actor, at } => {
            let finished = world.actor(actor).map_or(false, |a| a.is_player());
            if finished {
                GameEvent::PlayerFinished { id: actor, at }
            } else {
                GameEvent::BoxOnGoal { id: actor, at }
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Input gate
// ══════════════════════════════════════════════════════════════

/// Request a direction for one player. Rejected (returns false) for
/// boxes, finished players, unknown ids, and whenever any player is
/// still moving. `None` is a request to stop and follows the same gate.
#[allow(dead_code)]
pub fn set_direction(world: &mut WorldState, id: ActorId, direction: Option<Direction>) -> bool {
    if !world.loaded || rules::any_player_moving(&world.actors) {
        return false;
    }
    match world.actors.iter_mut().find(|a| a.id == id) {
        Some(a) if a.is_player() && !a.finished => {
            a.direction = direction;
            true
        }
        _ => false,
    }
}

/// Send every unfinished player the same way. The gate is checked once
/// for the whole group. Returns true if any player accepted.
pub fn steer_players(world: &mut WorldState, direction: Direction) -> bool {
    if !world.loaded || rules::any_player_moving(&world.actors) {
        return false;
    }
    let mut any = false;
    for a in world.actors.iter_mut().filter(|a| a.is_player() && !a.finished) {
        a.direction = Some(direction);
        any = true;
    }
    any
}

pub fn toggle_pause(world: &mut WorldState) -> bool {
    if world.loaded {
        world.paused = !world.paused;
    }
    world.paused
}

// ══════════════════════════════════════════════════════════════
// Level transitions
// ══════════════════════════════════════════════════════════════

/// Make level `index` active. On error the session is left as it was.
pub fn load_level(world: &mut WorldState, index: usize) -> Result<(), LevelError> {
    let def = world.levels.get(index).ok_or(LevelError::NotFound { index })?;
    let name = def.name.clone();
    let loaded = match parse_level(&def.source) {
        Ok(l) => l,
        Err(e) => {
            tracing::warn!(level = index, %name, error = %e, "level rejected");
            return Err(e);
        }
    };

    world.grid = loaded.grid;
    world.actors = loaded.actors;
    world.current_level = index;
    world.loaded = true;
    world.paused = false;
    world.tick = 0;
    world.refit_scale();

    tracing::info!(
        level = index,
        %name,
        width = world.grid.width,
        height = world.grid.height,
        actors = world.actors.len(),
        "level loaded"
    );
    Ok(())
}

/// Rebuild the current level from its text. Allowed at any time.
pub fn restart_level(world: &mut WorldState) -> Result<(), LevelError> {
    tracing::info!(level = world.current_level, "level reset");
    load_level(world, world.current_level)
}

/// Move to the next level. Only a solved level can be left this way, and
/// there is nothing past the last one. Returns whether a new level loaded.
pub fn advance_level(world: &mut WorldState) -> Result<bool, LevelError> {
    if !world.is_level_complete() || !world.has_next_level() {
        return Ok(false);
    }
    load_level(world, world.current_level + 1)?;
    Ok(true)
}

/// Title → first level.
pub fn start_game(world: &mut WorldState) -> Result<(), LevelError> {
    load_level(world, 0)?;
    world.phase = Phase::Playing;
    Ok(())
}

pub fn return_to_title(world: &mut WorldState) {
    world.phase = Phase::Title;
    world.paused = false;
}
