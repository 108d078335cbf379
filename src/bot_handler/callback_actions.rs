use serde::{Deserialize, Serialize};

/// Payload of inline keyboard buttons. Serialized as JSON, which has to fit
/// Telegram's 64 byte callback data limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallbackAction {
    /// Re-run the subscription check for the given group chat id.
    Recheck(i64),
    /// Show the user's groups.
    MyGroups,
    /// Show the command list.
    Help,
}

impl CallbackAction {
    /// Decodes button data. Unknown payloads give `None`.
    pub fn from_data(data: &str) -> Option<Self> {
        serde_json::from_str(data).ok()
    }
}
