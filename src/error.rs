use std::fmt;

#[derive(Debug)]
pub enum AppError {
    DatabaseError(String),
    ConfigurationError(String),
    TaskError(String),
    WorkloadFailed { failed: usize, total: usize },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::TaskError(msg) => write!(f, "Task error: {}", msg),
            AppError::WorkloadFailed { failed, total } => {
                write!(f, "Workload failed: {} of {} tasks returned an error", failed, total)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
