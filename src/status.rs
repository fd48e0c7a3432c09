use std::fmt::Display;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Code {
    // Generic errors.
    InvalidClientReq,
    InvalidStateTransition,
    InternalServerError,

    // Card data errors.
    FileReadError,
    InvalidSetPackFormat,
    InvalidDeckCode,

    // Sampling errors.
    MaxRedrawsExceeded,
    NoEligibleCards,

    // Draft state errors.
    NotInDraftSession,
    DraftComplete,
    NotWaitingForCardSelection,
    NotPendingCard,
    IncorrectNumChosenCards,
    IllegalCardCombination,
    RoundInFlight,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Status {
    pub code: Code,
    pub message: String,
}

impl Status {
    pub fn new<S: ToString>(code: Code, message: S) -> Self {
        Self {
            code,
            message: message.to_string(),
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for Status {}

pub type Res<T> = Result<T, Status>;

pub fn err<T, S: ToString>(code: Code, message: S) -> Res<T> {
    Err(Status::new(code, message))
}
