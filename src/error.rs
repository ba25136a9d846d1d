use thiserror::Error;

/// Failures raised by the analysis engine.
///
/// `DegenerateInput` is terminal for the computation that raised it: the same
/// input always reproduces it, so callers surface it instead of retrying.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("{computation}: degenerate input ({reason})")]
    DegenerateInput {
        computation: &'static str,
        reason: String,
    },
    #[error("invalid tracer series: {0}")]
    InvalidSeries(String),
    #[error("optimizer failure: {0}")]
    Optimizer(String),
}

impl AnalysisError {
    pub fn degenerate(computation: &'static str, reason: impl Into<String>) -> Self {
        AnalysisError::DegenerateInput {
            computation,
            reason: reason.into(),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(self, AnalysisError::DegenerateInput { .. })
    }
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        let exit_code = match err {
            AnalysisError::DegenerateInput { .. } | AnalysisError::InvalidSeries(_) => 3,
            AnalysisError::Optimizer(_) => 4,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
