use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid migration set: {0}")]
    InvalidMigrations(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("migration {id} failed: {reason}")]
    Migration { id: i64, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A failure that was followed by a second failure while cleaning up.
    /// `primary` is the error the caller should act on.
    #[error("{primary} (cleanup also failed: {secondary})")]
    Suppressed {
        primary: Box<Error>,
        secondary: Box<Error>,
    },

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Attach a cleanup failure to this error without replacing it.
    pub fn suppress(self, secondary: Error) -> Self {
        Error::Suppressed {
            primary: Box::new(self),
            secondary: Box::new(secondary),
        }
    }

    /// The original error, looking through any attached cleanup failures.
    pub fn primary(&self) -> &Error {
        match self {
            Error::Suppressed { primary, .. } => primary.primary(),
            other => other,
        }
    }

    /// Cleanup failures attached to this error, innermost first.
    pub fn suppressed(&self) -> Vec<&Error> {
        let mut out = Vec::new();
        let mut current = self;
        while let Error::Suppressed { primary, secondary } = current {
            out.push(secondary.as_ref());
            current = primary;
        }
        out.reverse();
        out
    }
}
