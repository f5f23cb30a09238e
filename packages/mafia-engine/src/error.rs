use crate::models::{GamePhase, GameStatus, NightActionKind, PlayerId};

/// Rejection reasons and invariant violations raised by a game session.
///
/// The `Display` text is short and safe to show to players.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("Unknown role: {0}")]
    RoleNotFound(String),
    #[error("Unknown game mode: {0}")]
    UnknownMode(String),
    #[error("Game already started!")]
    AlreadyStarted,
    #[error("You're already in this game!")]
    AlreadyJoined,
    #[error("Game lobby is full!")]
    LobbyFull,
    #[error("You're not in this game!")]
    NotAParticipant,
    #[error("Only creator can {0}!")]
    NotCreator(&'static str),
    #[error("The creator cannot leave; cancel the game instead.")]
    CreatorCannotLeave,
    #[error("Need {required} players!")]
    NotEnoughPlayers { required: usize },
    #[error("Too many players! Max is {max}.")]
    TooManyPlayers { max: usize },
    #[error("Game in progress!")]
    GameInProgress,
    #[error("Game is not running.")]
    NotInProgress,
    #[error("It is not {0} right now.")]
    WrongPhase(GamePhase),
    #[error("Dead players cannot act.")]
    ActorNotAlive,
    #[error("Your role cannot {0}.")]
    ActionNotAllowed(NightActionKind),
    #[error("Target is not a living player in this game.")]
    InvalidTarget(PlayerId),
    #[error("You cannot target your own team.")]
    CannotTargetTeammate,
    #[error("You cannot investigate yourself.")]
    CannotTargetSelf,
    #[error("You cannot protect the same player two nights in a row.")]
    RepeatProtection,
    #[error("Session is in {status:?}/{phase:?}, expected {expected:?}.")]
    PhaseMismatch {
        status: GameStatus,
        phase: GamePhase,
        expected: GamePhase,
    },
}

impl GameError {
    /// Errors that mean the driver asked the session to do something its
    /// state machine cannot do, as opposed to a rejected player request.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, GameError::PhaseMismatch { .. })
    }
}
