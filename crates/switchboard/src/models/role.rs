use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// The author of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_value(Role::Tool).unwrap(), "tool");
        assert_eq!(Role::Assistant.to_string(), "assistant");
        assert_eq!(Role::from_str("system").unwrap(), Role::System);
        assert!(Role::from_str("moderator").is_err());
    }
}
