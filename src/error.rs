use thiserror::Error;

/// Error kinds for the comment pipeline.
///
/// Fetch and parse failures are absorbed at the page level (zero comments),
/// processing failures at the comment level (comment dropped). Only
/// configuration errors abort the run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("request timed out")]
    Timeout,

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("parse failed: {0}")]
    Parse(String),

    #[error("processing failed: {0}")]
    Processing(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PipelineError::Timeout
        } else if let Some(status) = err.status() {
            PipelineError::Status(status.as_u16())
        } else {
            PipelineError::Fetch(err.to_string())
        }
    }
}

impl PipelineError {
    /// True for errors recovered locally as "zero comments for this page".
    pub fn is_page_local(&self) -> bool {
        matches!(
            self,
            PipelineError::Fetch(_)
                | PipelineError::Timeout
                | PipelineError::Status(_)
                | PipelineError::Parse(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_local_classification() {
        assert!(PipelineError::Fetch("conn refused".into()).is_page_local());
        assert!(PipelineError::Timeout.is_page_local());
        assert!(PipelineError::Status(403).is_page_local());
        assert!(PipelineError::Parse("bad html".into()).is_page_local());
        assert!(!PipelineError::Processing("scorer".into()).is_page_local());
        assert!(!PipelineError::Configuration("missing file".into()).is_page_local());
    }
}
