/// WorldState: the session. One active level plus everything needed to
/// move between levels.
///
/// ## State
///
///   - `Loading`: no level has been loaded yet (or the level list is empty).
///   - `Active`:  a level is loaded and ticks run.
///   - `Paused`:  a level is loaded, ticks only run when forced.
///
/// "Completed" is not stored: `is_level_complete()` derives it from the
/// actors every time it is asked.
///
/// ## Display scale
///
/// `scale` is how many terminal rows one grid cell takes (columns are
/// doubled). It is cached per level and recomputed whenever the level
/// or the viewport changes, via `set_viewport()`.

use crate::domain::entity::{Actor, ActorId};
use crate::domain::grid::{BoardView, Grid, Occupant};
use crate::domain::rules;
use crate::sim::level::LevelDef;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Title,
    Playing,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SessionState {
    Loading,
    Active,
    Paused,
}

pub struct WorldState {
    // ── Levels ──
    pub levels: Vec<LevelDef>,
    pub current_level: usize,
    pub loaded: bool,

    // ── Active level ──
    pub grid: Grid,
    pub actors: Vec<Actor>,
    pub tick: u64,

    // ── Meta ──
    pub phase: Phase,
    pub paused: bool,

    // ── Display ──
    pub scale: usize,
    pub viewport: (usize, usize),

    // ── UI ──
    pub message: String,
    pub message_timer: u32,
    pub anim_tick: u32,
}

impl WorldState {
    pub fn new(levels: Vec<LevelDef>) -> Self {
        WorldState {
            levels,
            current_level: 0,
            loaded: false,
            grid: Grid::new(0, 0),
            actors: vec![],
            tick: 0,
            phase: Phase::Title,
            paused: false,
            scale: 1,
            viewport: (0, 0),
            message: String::new(),
            message_timer: 0,
            anim_tick: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        if !self.loaded {
            SessionState::Loading
        } else if self.paused {
            SessionState::Paused
        } else {
            SessionState::Active
        }
    }

    /// Every player stands on a goal. Pure; safe to call any number of times.
    pub fn is_level_complete(&self) -> bool {
        self.loaded && rules::all_players_finished(&self.actors)
    }

    pub fn has_next_level(&self) -> bool {
        self.current_level + 1 < self.levels.len()
    }

    pub fn current_def(&self) -> Option<&LevelDef> {
        self.levels.get(self.current_level)
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.iter().find(|a| a.id == id)
    }

    pub fn players(&self) -> impl Iterator<Item = &Actor> {
        self.actors.iter().filter(|a| a.is_player())
    }

    /// What the renderer should draw at (x, y).
    pub fn occupant_at(&self, x: usize, y: usize) -> Occupant {
        BoardView::new(&self.grid, &self.actors).occupant_at(x, y)
    }

    /// Record the space available for the map and refit the scale.
    /// `cols`/`rows` are terminal cells.
    pub fn set_viewport(&mut self, cols: usize, rows: usize) {
        self.viewport = (cols, rows);
        self.refit_scale();
    }

    /// Largest integer scale at which the whole grid fits, at least 1.
    pub fn refit_scale(&mut self) {
        let (cols, rows) = self.viewport;
        if self.grid.width == 0 || self.grid.height == 0 {
            self.scale = 1;
            return;
        }
        // one cell = scale rows × 2*scale columns
        let by_w = cols / (self.grid.width * 2);
        let by_h = rows / self.grid.height;
        self.scale = by_w.min(by_h).max(1);
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }

    /// Per-frame UI timers. Runs whether or not the simulation ticks.
    pub fn tick_ui(&mut self) {
        self.anim_tick = self.anim_tick.wrapping_add(1);
        if self.message_timer > 0 {
            self.message_timer -= 1;
            if self.message_timer == 0 {
                self.message.clear();
            }
        }
    }
}
