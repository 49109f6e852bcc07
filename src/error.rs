use std::fmt;

#[derive(Debug, Clone)]
pub enum Error {
    InvalidData(String),
    InvalidConfig(String),
    InvalidShape(String),
    /// Analytic and numeric gradients disagree at `index`.
    GradCheck {
        index: usize,
        analytic: f64,
        numeric: f64,
        rel_diff: f64,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidData(msg) => write!(f, "invalid data: {msg}"),
            Error::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Error::InvalidShape(msg) => write!(f, "invalid shape: {msg}"),
            Error::GradCheck {
                index,
                analytic,
                numeric,
                rel_diff,
            } => write!(
                f,
                "gradient check failed at index {index}: analytic {analytic}, numeric {numeric}, relative difference {rel_diff:e}"
            ),
        }
    }
}

impl std::error::Error for Error {}
