use serde::{Deserialize, Serialize};

pub const SUCCESS_MESSAGE: &str = "Site is up and running.";

// Health check response body
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct StatusBody {
    pub status: String,
    pub message: String,
}

impl StatusBody {
    pub fn ok() -> Self {
        Self {
            status: "OK".to_string(),
            message: SUCCESS_MESSAGE.to_string(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "ERROR".to_string(),
            message: message.into(),
        }
    }
}
