use std::fmt;

/// Errors surfaced while setting up a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupError {
    /// No catalog entry for the requested id. Nothing was built.
    UnknownLevel(u32),
    /// The level grants no shapes. The session still runs with an empty palette.
    EmptyShapeBudget(u32),
}

impl SetupError {
    /// Numeric code reported to the host.
    pub fn code(self) -> u32 {
        match self {
            SetupError::UnknownLevel(_) => 1,
            SetupError::EmptyShapeBudget(_) => 2,
        }
    }

    pub fn level_id(self) -> u32 {
        match self {
            SetupError::UnknownLevel(id) | SetupError::EmptyShapeBudget(id) => id,
        }
    }
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupError::UnknownLevel(id) => write!(f, "no level with id {}", id),
            SetupError::EmptyShapeBudget(id) => write!(f, "level {} grants no shapes", id),
        }
    }
}

impl std::error::Error for SetupError {}
