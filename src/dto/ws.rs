use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{catalog::SortKey, dao::models::Theme, dto::catalog::GameView};

#[derive(Debug, Deserialize, Serialize, ToSchema)]
/// Messages accepted from interactive session clients.
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionInboundMessage {
    /// A named key symbol, e.g. `ArrowUp` or `b`.
    Key { key: String },
    LuckyCharm,
    Search { term: String },
    Category { id: String },
    Sort { sort: SortKey },
    SelectGame { id: String },
    CloseGame,
    ToggleSidebar,
    ToggleTheme,
    /// Attach a session token obtained from `/auth/*`.
    Identify { token: String },
    #[serde(other)]
    Unknown,
}

impl SessionInboundMessage {
    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
/// Messages pushed to interactive session clients.
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionOutboundMessage {
    Visible { games: Vec<GameView> },
    SecretMode { enabled: bool },
    Hue { angle: u16 },
    Shuffled,
    Idle { message: String },
    Selected { game: Option<GameView> },
    Sidebar { open: bool },
    Theme { theme: Theme },
    Auth {
        #[serde(rename = "userId", skip_serializing_if = "Option::is_none")]
        user_id: Option<String>,
    },
    Notification { message: String },
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn inbound_messages_are_tagged() {
        let msg = SessionInboundMessage::from_json_str(r#"{"type":"key","key":"ArrowUp"}"#).unwrap();
        assert!(matches!(msg, SessionInboundMessage::Key { key } if key == "ArrowUp"));

        let msg = SessionInboundMessage::from_json_str(r#"{"type":"sort","sort":"popularity-descending"}"#)
            .unwrap();
        assert!(matches!(
            msg,
            SessionInboundMessage::Sort {
                sort: SortKey::PopularityDescending
            }
        ));

        let msg = SessionInboundMessage::from_json_str(r#"{"type":"dance"}"#).unwrap();
        assert!(matches!(msg, SessionInboundMessage::Unknown));
    }

    #[test]
    fn outbound_messages_are_tagged() {
        let value = serde_json::to_value(SessionOutboundMessage::Hue { angle: 90 }).unwrap();
        assert_eq!(value, json!({"type": "hue", "angle": 90}));

        let value = serde_json::to_value(SessionOutboundMessage::Auth { user_id: None }).unwrap();
        assert_eq!(value, json!({"type": "auth"}));
    }
}
