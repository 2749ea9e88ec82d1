use std::fmt;

/// Errors raised by quest and progression operations.
///
/// These are user-facing: the caller shows them as a blocking message and the
/// session state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    InvalidParameter(String),
    NotFound(String),
    MissingField(&'static str),
    InvalidState(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CoreError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            CoreError::NotFound(msg) => write!(f, "Not found: {}", msg),
            CoreError::MissingField(field) => write!(f, "Missing required field: {}", field),
            CoreError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
        }
    }
}

impl std::error::Error for CoreError {}

impl CoreError {
    pub(crate) fn quest_not_found(quest_id: &str) -> Self {
        CoreError::NotFound(format!("Quest not found: {}", quest_id))
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(CoreError::MissingField("title").to_string(), "Missing required field: title");
        assert_eq!(
            CoreError::quest_not_found("q-1").to_string(),
            "Not found: Quest not found: q-1"
        );
    }
}
