/// Actors: Player and Box share one struct, told apart by `ActorKind`.
///
/// An actor keeps its direction across ticks: once set, it slides until a
/// wall, another actor, or a goal stops it.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Direction {
    Right,
    Up,
    Left,
    Down,
}

impl Direction {
    /// Unit step in grid coordinates (y grows downward).
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Right => (1, 0),
            Direction::Up => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Down => (0, 1),
        }
    }

    /// Cell one step away from `pos`. Stepping off the top/left edge yields
    /// `None`; stepping off the bottom/right edge is left to the grid's
    /// bounds check.
    pub fn step(self, pos: Pos) -> Option<Pos> {
        let (dx, dy) = self.delta();
        let x = pos.0 as i64 + dx as i64;
        let y = pos.1 as i64 + dy as i64;
        if x < 0 || y < 0 {
            None
        } else {
            Some((x as usize, y as usize))
        }
    }
}

/// Grid coordinate `(x, y)`.
pub type Pos = (usize, usize);

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
pub enum ActorKind {
    Player,
    Box,
}

/// Stable identity within a level instance.
/// Indices are assigned in scan order separately per kind, so the first
/// player and the first box are both index 0.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
pub struct ActorId {
    pub kind: ActorKind,
    pub index: usize,
}

impl ActorId {
    pub fn player(index: usize) -> Self {
        ActorId { kind: ActorKind::Player, index }
    }

    pub fn boxed(index: usize) -> Self {
        ActorId { kind: ActorKind::Box, index }
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ActorKind::Player => write!(f, "player#{}", self.index),
            ActorKind::Box => write!(f, "box#{}", self.index),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub id: ActorId,
    pub x: usize,
    pub y: usize,
    pub direction: Option<Direction>,
    /// Provisional position computed during a tick, committed afterwards.
    pub next: Pos,
    /// Player only. Set on reaching a goal; only a reload clears it.
    pub finished: bool,
}

impl Actor {
    pub fn new(id: ActorId, x: usize, y: usize) -> Self {
        Actor {
            id,
            x, y,
            direction: None,
            next: (x, y),
            finished: false,
        }
    }

    pub fn pos(&self) -> Pos {
        (self.x, self.y)
    }

    pub fn kind(&self) -> ActorKind {
        self.id.kind
    }

    pub fn is_player(&self) -> bool {
        self.id.kind == ActorKind::Player
    }

    pub fn is_box(&self) -> bool {
        self.id.kind == ActorKind::Box
    }

    pub fn is_moving(&self) -> bool {
        self.direction.is_some()
    }

    /// Copy the provisional position into the committed one.
    pub fn commit(&mut self) {
        self.x = self.next.0;
        self.y = self.next.1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_moves_one_cell() {
        assert_eq!(Direction::Right.step((2, 2)), Some((3, 2)));
        assert_eq!(Direction::Up.step((2, 2)), Some((2, 1)));
        assert_eq!(Direction::Left.step((2, 2)), Some((1, 2)));
        assert_eq!(Direction::Down.step((2, 2)), Some((2, 3)));
    }

    #[test]
    fn step_off_top_left_is_none() {
        assert_eq!(Direction::Left.step((0, 3)), None);
        assert_eq!(Direction::Up.step((3, 0)), None);
    }

    #[test]
    fn new_actor_is_idle() {
        let a = Actor::new(ActorId::boxed(3), 4, 5);
        assert_eq!(a.pos(), (4, 5));
        assert_eq!(a.next, (4, 5));
        assert!(!a.is_moving());
        assert!(!a.finished);
        assert!(a.is_box());
    }

    #[test]
    fn commit_copies_next() {
        let mut a = Actor::new(ActorId::player(0), 1, 1);
        a.next = (2, 1);
        assert_eq!(a.pos(), (1, 1));
        a.commit();
        assert_eq!(a.pos(), (2, 1));
    }

    #[test]
    fn ids_order_players_before_boxes() {
        assert!(ActorId::player(5) < ActorId::boxed(0));
        assert_eq!(ActorId::player(1).to_string(), "player#1");
        assert_eq!(ActorId::boxed(2).to_string(), "box#2");
    }
}
