use sqlx::error::ErrorKind;

// ============================================================================
// Store Errors
// ============================================================================
//
// Every variant carries the name of the row primitive that failed. The store
// never recovers from an error; classification happens once, here.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{operation}: constraint violated: {message}")]
    Constraint {
        operation: &'static str,
        message: String,
    },

    #[error("{operation}: timed out waiting for the database")]
    Timeout { operation: &'static str },

    #[error("{operation}: {source}")]
    Database {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("{operation}: malformed row: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },
}

impl StoreError {
    /// Classify a driver error raised by `operation`.
    pub fn from_sqlx(operation: &'static str, err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(ref db_err) => match db_err.kind() {
                ErrorKind::ForeignKeyViolation
                | ErrorKind::UniqueViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation => Self::Constraint {
                    operation,
                    message: db_err.message().to_string(),
                },
                _ => Self::Database {
                    operation,
                    source: err,
                },
            },
            sqlx::Error::PoolTimedOut => Self::Timeout { operation },
            sqlx::Error::Io(ref io) if io.kind() == std::io::ErrorKind::TimedOut => {
                Self::Timeout { operation }
            }
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::Decode(_) => Self::Decode {
                operation,
                message: err.to_string(),
            },
            other => Self::Database {
                operation,
                source: other,
            },
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            Self::Constraint { operation, .. }
            | Self::Timeout { operation }
            | Self::Database { operation, .. }
            | Self::Decode { operation, .. } => operation,
        }
    }

    pub fn is_constraint(&self) -> bool {
        matches!(self, Self::Constraint { .. })
    }
}
