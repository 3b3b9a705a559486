use serde::{Deserialize, Serialize};
use validator::Validate;

/// Simple message response for endpoints with nothing else to say
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Query string for the monthly revenue report
#[derive(Debug, Deserialize, Validate)]
pub struct MonthQuery {
    #[validate(range(min = 1970, max = 9999))]
    pub year: i32,

    #[validate(range(min = 1, max = 12))]
    pub month: u8,
}
