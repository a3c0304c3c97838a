//! Subscriber line identity.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use validator::{Validate, ValidationError};

/// Identifies one billed line: the pair `(user_id, device_number)`.
///
/// Device numbers can be reused across users, so every lookup is scoped by
/// the pair and never by the device number alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, FromRow)]
pub struct SubscriberKey {
    pub user_id: String,
    #[sqlx(rename = "mdn")]
    pub device_number: String,
}

impl SubscriberKey {
    pub fn new(user_id: impl Into<String>, device_number: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            device_number: device_number.into(),
        }
    }
}

impl fmt::Display for SubscriberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user: {} and mdn: {}", self.user_id, self.device_number)
    }
}

/// Inbound line identity as received from HTTP query strings or gRPC requests.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LineInfo {
    #[validate(custom(function = "not_blank", message = "userId is required"))]
    pub user_id: String,
    #[validate(custom(function = "not_blank", message = "mdn is required"))]
    pub mdn: String,
}

impl LineInfo {
    pub fn new(user_id: impl Into<String>, mdn: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            mdn: mdn.into(),
        }
    }
}

impl From<&LineInfo> for SubscriberKey {
    fn from(line: &LineInfo) -> Self {
        SubscriberKey::new(line.user_id.clone(), line.mdn.clone())
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}
