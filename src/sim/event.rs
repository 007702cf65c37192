/// What a tick did, one entry per resolver outcome plus `LevelSolved`.
/// The game loop turns these into HUD messages; the log gets them too.

use crate::domain::entity::{ActorId, Direction, Pos};

#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(dead_code)]
pub enum GameEvent {
    ActorMoved { id: ActorId, from: Pos, to: Pos },
    /// Wall, actor or contested cell; the actor's direction was cleared.
    ActorBlocked { id: ActorId, at: Pos },
    BoxPushed { by: ActorId, pushed: ActorId, direction: Direction },
    PlayerFinished { id: ActorId, at: Pos },
    BoxOnGoal { id: ActorId, at: Pos },
    /// Emitted once, on the tick the last player reached a goal.
    LevelSolved,
}
