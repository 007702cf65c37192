/// Static tile types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.
///
/// Actors (players, boxes) are never stored as tiles; the grid keeps
/// them in a separate occupancy layer.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Tile {
    #[default]
    Floor,
    Wall,
    Goal,
}

impl Tile {
    /// Can an actor occupy this cell (ignoring other actors)?
    pub fn is_passable(self) -> bool {
        matches!(self, Tile::Floor | Tile::Goal)
    }

    pub fn is_goal(self) -> bool {
        matches!(self, Tile::Goal)
    }

    /// Tile for a level-text digit. Spawn digits are not tiles.
    pub fn from_digit(ch: char) -> Option<Tile> {
        match ch {
            '0' => Some(Tile::Floor),
            '1' => Some(Tile::Wall),
            '9' => Some(Tile::Goal),
            _ => None,
        }
    }
}
