/// Grid: the static tile layer plus an occupancy lookup for actors.
///
/// ## Layers
///
///   - `Grid`:           walls, floor and goals. Never holds an actor.
///   - `OccupancyIndex`: dense `cell → arena index` table built from a
///                        slice of actors. Rebuilt from the pre-tick
///                        snapshot, so lookups during a tick never see
///                        a half-updated position.
///   - `BoardView`:      both layers together, answering
///                        "what is at (x, y)?" with an `Occupant`.
///
/// Out-of-bounds reads are `Wall`; no query on this path can fail.

use super::entity::{Actor, ActorKind, Pos};
use super::tile::Tile;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    pub width: usize,
    pub height: usize,
    /// `tiles[y][x]`
    tiles: Vec<Vec<Tile>>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Grid { width, height, tiles: vec![vec![Tile::Floor; width]; height] }
    }

    /// Build from rows of tiles. Callers guarantee the rows are rectangular.
    pub fn from_rows(tiles: Vec<Vec<Tile>>) -> Self {
        let height = tiles.len();
        let width = tiles.first().map_or(0, |r| r.len());
        Grid { width, height, tiles }
    }

    #[inline]
    pub fn is_within_bounds(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    /// Static tile at (x, y). Out of bounds = wall.
    #[inline]
    pub fn tile_at(&self, x: usize, y: usize) -> Tile {
        if self.is_within_bounds(x, y) {
            self.tiles[y][x]
        } else {
            Tile::Wall
        }
    }

    /// Overwrite the static tile only. Actor occupancy is tracked elsewhere.
    #[allow(dead_code)]
    #[inline]
    pub fn set_tile(&mut self, x: usize, y: usize, tile: Tile) {
        if self.is_within_bounds(x, y) {
            self.tiles[y][x] = tile;
        }
    }
}

/// What a cell holds, actors taking precedence over tiles.
/// Actor variants carry the arena index into the actor slice.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Occupant {
    Floor,
    Wall,
    Goal,
    Player(usize),
    Box(usize),
}

impl Occupant {
    fn from_tile(tile: Tile) -> Self {
        match tile {
            Tile::Floor => Occupant::Floor,
            Tile::Wall => Occupant::Wall,
            Tile::Goal => Occupant::Goal,
        }
    }
}

/// O(1) `cell → arena index` lookup.
#[derive(Clone, Debug)]
pub struct OccupancyIndex {
    width: usize,
    height: usize,
    cells: Vec<Option<usize>>,
}

impl OccupancyIndex {
    /// Index actors by their committed position. If two actors share a cell
    /// the earlier arena entry wins; a conforming tick never produces that.
    pub fn build(width: usize, height: usize, actors: &[Actor]) -> Self {
        let mut cells = vec![None; width * height];
        for (i, a) in actors.iter().enumerate() {
            if a.x < width && a.y < height {
                let slot = &mut cells[a.y * width + a.x];
                if slot.is_none() {
                    *slot = Some(i);
                }
            }
        }
        OccupancyIndex { width, height, cells }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<usize> {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            None
        }
    }
}

/// Immutable view of grid + actors for rule queries.
pub struct BoardView<'a> {
    pub grid: &'a Grid,
    pub actors: &'a [Actor],
    occupancy: OccupancyIndex,
}

impl<'a> BoardView<'a> {
    pub fn new(grid: &'a Grid, actors: &'a [Actor]) -> Self {
        let occupancy = OccupancyIndex::build(grid.width, grid.height, actors);
        BoardView { grid, actors, occupancy }
    }

    pub fn occupant_at(&self, x: usize, y: usize) -> Occupant {
        if !self.grid.is_within_bounds(x, y) {
            return Occupant::Wall;
        }
        match self.occupancy.get(x, y) {
            Some(i) => match self.actors[i].kind() {
                ActorKind::Player => Occupant::Player(i),
                ActorKind::Box => Occupant::Box(i),
            },
            None => Occupant::from_tile(self.grid.tile_at(x, y)),
        }
    }

    /// Floor or goal, and no actor standing there.
    #[allow(dead_code)]
    pub fn is_passable(&self, x: usize, y: usize) -> bool {
        matches!(self.occupant_at(x, y), Occupant::Floor | Occupant::Goal)
    }

    /// Arena index of the actor at `pos`, if any.
    pub fn actor_at(&self, pos: Pos) -> Option<usize> {
        self.occupancy.get(pos.0, pos.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::ActorId;

    /// Helper: build a Grid from a string diagram.
    /// Legend:  '#'=Wall  '.'=Goal  anything else=Floor
    fn grid_from(rows: &[&str]) -> Grid {
        Grid::from_rows(
            rows.iter()
                .map(|r| r.chars().map(|c| match c {
                    '#' => Tile::Wall,
                    '.' => Tile::Goal,
                    _ => Tile::Floor,
                }).collect())
                .collect(),
        )
    }

    #[test]
    fn bounds() {
        let g = grid_from(&["   ", "   "]);
        assert_eq!((g.width, g.height), (3, 2));
        assert!(g.is_within_bounds(2, 1));
        assert!(!g.is_within_bounds(3, 0));
        assert!(!g.is_within_bounds(0, 2));
    }

    #[test]
    fn out_of_bounds_is_wall() {
        let g = grid_from(&["   "]);
        assert_eq!(g.tile_at(9, 9), Tile::Wall);
        let view = BoardView::new(&g, &[]);
        assert_eq!(view.occupant_at(3, 0), Occupant::Wall);
    }

    #[test]
    fn actor_shadows_tile() {
        let g = grid_from(&[" . "]);
        let actors = vec![
            Actor::new(ActorId::player(0), 0, 0),
            Actor::new(ActorId::boxed(0), 1, 0),
        ];
        let view = BoardView::new(&g, &actors);
        assert_eq!(view.occupant_at(0, 0), Occupant::Player(0));
        assert_eq!(view.occupant_at(1, 0), Occupant::Box(1));
        assert_eq!(view.occupant_at(2, 0), Occupant::Floor);
        assert_eq!(view.actor_at((1, 0)), Some(1));
        assert_eq!(view.actor_at((2, 0)), None);
        assert!(!view.is_passable(1, 0));
        assert!(view.is_passable(2, 0));
        assert!(!view.is_passable(3, 0));
    }

    #[test]
    fn set_tile_touches_static_layer_only() {
        let mut g = grid_from(&["  "]);
        let actors = vec![Actor::new(ActorId::boxed(0), 0, 0)];
        g.set_tile(0, 0, Tile::Goal);
        g.set_tile(7, 7, Tile::Wall);
        assert_eq!(g.tile_at(0, 0), Tile::Goal);
        assert_eq!(g.tile_at(1, 0), Tile::Floor);
        let view = BoardView::new(&g, &actors);
        assert_eq!(view.occupant_at(0, 0), Occupant::Box(0));
    }

    #[test]
    fn goal_shows_through_when_empty() {
        let g = grid_from(&["."]);
        let view = BoardView::new(&g, &[]);
        assert_eq!(view.occupant_at(0, 0), Occupant::Goal);
        let actors = vec![Actor::new(ActorId::boxed(0), 0, 0)];
        let view = BoardView::new(&g, &actors);
        assert_eq!(view.occupant_at(0, 0), Occupant::Box(0));
        assert_eq!(g.tile_at(0, 0), Tile::Goal);
    }

    #[test]
    fn first_actor_wins_a_shared_cell() {
        let actors = vec![
            Actor::new(ActorId::player(0), 1, 0),
            Actor::new(ActorId::boxed(0), 1, 0),
        ];
        let idx = OccupancyIndex::build(2, 1, &actors);
        assert_eq!(idx.get(1, 0), Some(0));
        assert_eq!(idx.get(5, 0), None);
    }
}
