use thiserror::Error;

/// Errors produced by page index operations
#[derive(Debug, Error)]
pub enum Error {
    /// No page matched, or the environment has no index yet
    #[error("not found")]
    NotFound,

    /// The request body had neither a single page nor a batch of pages
    #[error("invalid request: {0}")]
    Validation(String),

    /// The index store or environment registry failed to load or save
    #[error("persistence failure while {context}: {source}")]
    Persistence {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A page that should have been deleted is still present in the stored index
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// The environment could not be resolved
    #[error("unauthorized environment: {0}")]
    Unauthorized(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap a store or registry failure with a short description of what was being done
    pub fn persistence(
        context: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Error::Persistence {
            context: context.into(),
            source: source.into(),
        }
    }

    /// HTTP-style status class a transport layer should report for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::NotFound => 404,
            Error::Validation(_) => 400,
            Error::Unauthorized(_) => 401,
            Error::Persistence { .. } | Error::InvariantViolation(_) => 500,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::NotFound.status_code(), 404);
        assert_eq!(Error::Validation("x".into()).status_code(), 400);
        assert_eq!(Error::Unauthorized("env".into()).status_code(), 401);
        assert_eq!(
            Error::InvariantViolation("left over".into()).status_code(),
            500
        );
        let io = std::io::Error::other("disk full");
        assert_eq!(Error::persistence("saving index", io).status_code(), 500);
    }

    #[test]
    fn test_persistence_message_keeps_context() {
        let io = std::io::Error::other("disk full");
        let err = Error::persistence("saving index", io);
        assert_eq!(
            err.to_string(),
            "persistence failure while saving index: disk full"
        );
        assert!(!err.is_not_found());
    }
}
