/// Movement resolution: the rules of one tick.
///
/// Pure functions over a grid and a slice of actors. `resolve` never
/// mutates its input; it returns a copy of the actors with provisional
/// positions (`next`) and updated directions, plus a log of outcomes.
/// Positions become authoritative only when the caller runs `commit`.
///
/// ## Waves
///
/// Every decision reads the pre-tick snapshot. A tick runs two waves:
///
///   1. Every actor with a direction (finished players excluded).
///   2. Boxes pushed during wave 1. Cells entered in wave 1 are reserved,
///      cells vacated in wave 1 count as free.
///
/// A box blocked by another box in wave 2 hands that box its direction
/// for the next tick, so a row of boxes advances one link per tick.
///
/// ## Verdict table (per mover, per wave)
/// ┌───────────────────────────────────────────┬────────────────────────┐
/// │ Condition (priority order)                 │ Verdict                │
/// ├───────────────────────────────────────────┼────────────────────────┤
/// │ target off grid or Wall                    │ Wall: stop             │
/// │ target reserved by an earlier wave         │ Contested: stop        │
/// │ target holds an actor that is not leaving  │ Blocked: stop, push box│
/// │ target holds an actor leaving into my cell │ Blocked: stop, push box│
/// │ another live mover has the same target     │ Contested: stop        │
/// │ otherwise                                  │ Accept                 │
/// └───────────────────────────────────────────┴────────────────────────┘
///
/// Stops are applied to the whole wave at once and the table is
/// re-evaluated until nothing changes, so the result does not depend on
/// arena order.
///
/// Accepting onto a goal clears the direction; a player also becomes
/// `finished`.

use std::collections::{BTreeMap, HashMap, HashSet};

use super::entity::{Actor, ActorId, Direction, Pos};
use super::grid::{BoardView, Grid};

/// What happened to an actor during resolution.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Moved { actor: ActorId, from: Pos, to: Pos },
    Stopped { actor: ActorId, at: Pos, cause: StopCause },
    Pushed { pusher: ActorId, pushed: ActorId, direction: Direction },
    ReachedGoal { actor: ActorId, at: Pos },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StopCause {
    Wall,
    Actor(ActorId),
    Contested,
}

/// Result of `resolve`: provisional actors plus the outcome log.
#[derive(Clone, Debug)]
pub struct Resolution {
    pub actors: Vec<Actor>,
    pub outcomes: Vec<Outcome>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Verdict {
    Accept(Pos),
    Wall,
    Contested,
    Blocked(usize),
}

/// A push request: `pusher` ran into box `target` while heading `direction`.
struct Push {
    pusher: usize,
    target: usize,
    direction: Direction,
}

// ══════════════════════════════════════════════════════════════
// Entry points
// ══════════════════════════════════════════════════════════════

/// Compute every actor's provisional position for one tick.
pub fn resolve(grid: &Grid, actors: &[Actor]) -> Resolution {
    let view = BoardView::new(grid, actors);
    let mut next: Vec<Actor> = actors.to_vec();
    for a in &mut next {
        a.next = a.pos();
    }
    let mut outcomes = Vec::new();
    let mut leaving: Vec<Option<Pos>> = vec![None; actors.len()];

    // Wave 1: everyone with a direction.
    let movers: Vec<(usize, Direction)> = actors.iter()
        .enumerate()
        .filter(|(_, a)| !a.finished)
        .filter_map(|(i, a)| a.direction.map(|d| (i, d)))
        .collect();
    let verdicts = plan_wave(&view, &movers, &HashSet::new(), &leaving);
    let pushes = apply_wave(&view, &movers, &verdicts, &mut next, &mut leaving, &mut outcomes);
    let pushed = settle_pushes(actors, pushes, &mut next, &mut outcomes);

    // Wave 2: boxes pushed this tick.
    if !pushed.is_empty() {
        let reserved: HashSet<Pos> = leaving.iter().flatten().copied().collect();
        let verdicts = plan_wave(&view, &pushed, &reserved, &leaving);
        let deferred = apply_wave(&view, &pushed, &verdicts, &mut next, &mut leaving, &mut outcomes);
        settle_pushes(actors, deferred, &mut next, &mut outcomes);
    }

    Resolution { actors: next, outcomes }
}

/// Make provisional positions authoritative, all at once.
pub fn commit(actors: &mut [Actor]) {
    for a in actors {
        a.commit();
    }
}

/// A level is solved when every player stands on a goal.
pub fn all_players_finished(actors: &[Actor]) -> bool {
    actors.iter().filter(|a| a.is_player()).all(|a| a.finished)
}

/// Is any player still sliding?
pub fn any_player_moving(actors: &[Actor]) -> bool {
    actors.iter().any(|a| a.is_player() && a.is_moving())
}

// ══════════════════════════════════════════════════════════════
// Wave planning
// ══════════════════════════════════════════════════════════════

/// Decide a verdict for each mover. `leaving[i]` is the target of actor
/// `i` if an earlier wave already moved it out of its cell.
fn plan_wave(
    view: &BoardView,
    movers: &[(usize, Direction)],
    reserved: &HashSet<Pos>,
    leaving: &[Option<Pos>],
) -> Vec<Verdict> {
    let targets: Vec<Pos> = movers.iter()
        .map(|&(i, d)| {
            let here = view.actors[i].pos();
            d.step(here).unwrap_or(here)
        })
        .collect();

    let mut verdicts: Vec<Option<Verdict>> = movers.iter()
        .zip(&targets)
        .map(|(&(i, d), &t)| {
            let off_grid = d.step(view.actors[i].pos()).is_none();
            if off_grid || !view.grid.tile_at(t.0, t.1).is_passable() {
                Some(Verdict::Wall)
            } else if reserved.contains(&t) {
                Some(Verdict::Contested)
            } else {
                None
            }
        })
        .collect();

    let slot_of: HashMap<usize, usize> = movers.iter()
        .enumerate()
        .map(|(k, &(i, _))| (i, k))
        .collect();

    loop {
        let live: Vec<usize> = (0..movers.len()).filter(|&k| verdicts[k].is_none()).collect();

        let mut claims: HashMap<Pos, usize> = HashMap::new();
        for &k in &live {
            *claims.entry(targets[k]).or_insert(0) += 1;
        }

        let mut stops = Vec::new();
        for &k in &live {
            let t = targets[k];
            if let Some(o) = view.actor_at(t) {
                // Where is the occupant headed, if it is leaving at all?
                let heading = leaving[o].or_else(|| {
                    slot_of.get(&o)
                        .filter(|&&ko| verdicts[ko].is_none())
                        .map(|&ko| targets[ko])
                });
                let here = view.actors[movers[k].0].pos();
                match heading {
                    Some(h) if h != here => {}
                    _ => {
                        stops.push((k, Verdict::Blocked(o)));
                        continue;
                    }
                }
            }
            if claims[&t] > 1 {
                stops.push((k, Verdict::Contested));
            }
        }

        if stops.is_empty() {
            break;
        }
        for (k, v) in stops {
            verdicts[k] = Some(v);
        }
    }

    verdicts.into_iter()
        .zip(targets)
        .map(|(v, t)| v.unwrap_or(Verdict::Accept(t)))
        .collect()
}

/// Write verdicts into `next`. Returns the pushes this wave requested.
fn apply_wave(
    view: &BoardView,
    movers: &[(usize, Direction)],
    verdicts: &[Verdict],
    next: &mut [Actor],
    leaving: &mut [Option<Pos>],
    outcomes: &mut Vec<Outcome>,
) -> Vec<Push> {
    let mut pushes = Vec::new();

    for (&(i, d), &verdict) in movers.iter().zip(verdicts) {
        let actor = &mut next[i];
        let from = actor.pos();
        match verdict {
            Verdict::Accept(to) => {
                actor.next = to;
                actor.direction = Some(d);
                leaving[i] = Some(to);
                outcomes.push(Outcome::Moved { actor: actor.id, from, to });
                if view.grid.tile_at(to.0, to.1).is_goal() {
                    actor.direction = None;
                    if actor.is_player() {
                        actor.finished = true;
                    }
                    outcomes.push(Outcome::ReachedGoal { actor: actor.id, at: to });
                }
            }
            Verdict::Wall => {
                actor.direction = None;
                outcomes.push(Outcome::Stopped { actor: actor.id, at: from, cause: StopCause::Wall });
            }
            Verdict::Contested => {
                actor.direction = None;
                outcomes.push(Outcome::Stopped { actor: actor.id, at: from, cause: StopCause::Contested });
            }
            Verdict::Blocked(o) => {
                actor.direction = None;
                let blocker = view.actors[o].id;
                outcomes.push(Outcome::Stopped { actor: actor.id, at: from, cause: StopCause::Actor(blocker) });
                if view.actors[o].is_box() {
                    pushes.push(Push { pusher: i, target: o, direction: d });
                }
            }
        }
    }

    pushes
}

/// Hand each pushed box its pusher's direction. A box pushed two ways at
/// once gets nothing. Returns the accepted `(box, direction)` pairs in
/// arena order.
fn settle_pushes(
    actors: &[Actor],
    pushes: Vec<Push>,
    next: &mut [Actor],
    outcomes: &mut Vec<Outcome>,
) -> Vec<(usize, Direction)> {
    let mut by_box: BTreeMap<usize, Vec<Push>> = BTreeMap::new();
    for p in pushes {
        by_box.entry(p.target).or_default().push(p);
    }

    let mut accepted = Vec::new();
    for (target, group) in by_box {
        let direction = group[0].direction;
        if group.iter().any(|p| p.direction != direction) {
            tracing::debug!(actor = %actors[target].id, "conflicting pushes cancelled");
            continue;
        }
        next[target].direction = Some(direction);
        for p in &group {
            outcomes.push(Outcome::Pushed {
                pusher: actors[p.pusher].id,
                pushed: actors[target].id,
                direction,
            });
        }
        accepted.push((target, direction));
    }
    accepted
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
