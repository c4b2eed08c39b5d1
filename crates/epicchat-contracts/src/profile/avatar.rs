use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvatarProfile {
    pub name: String,
    pub image: String,
    pub personality: String,
}

impl Default for AvatarProfile {
    fn default() -> Self {
        Self {
            name: "Epic Tech".to_string(),
            image: "/images/avatar/frame-005.jpg".to_string(),
            personality: "friendly".to_string(),
        }
    }
}

impl AvatarProfile {
    pub fn merged(stored: &Value) -> Self {
        let mut avatar = Self::default();
        let Some(obj) = stored.as_object() else {
            return avatar;
        };
        let field = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);
        avatar.name = field("name").unwrap_or(avatar.name);
        avatar.image = field("image").unwrap_or(avatar.image);
        avatar.personality = field("personality").unwrap_or(avatar.personality);
        avatar
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::AvatarProfile;

    #[test]
    fn merged_keeps_defaults_for_missing_fields() {
        let avatar = AvatarProfile::merged(&json!({"name": "Nova", "mood": "sunny"}));
        assert_eq!(avatar.name, "Nova");
        assert_eq!(avatar.image, "/images/avatar/frame-005.jpg");
        assert_eq!(avatar.personality, "friendly");
    }

    #[test]
    fn merged_roundtrips_serialized_profile() -> anyhow::Result<()> {
        let avatar = AvatarProfile {
            name: "Nova".to_string(),
            image: "/images/avatar/frame-002.jpg".to_string(),
            personality: "curious".to_string(),
        };
        let value = serde_json::to_value(&avatar)?;
        assert_eq!(AvatarProfile::merged(&value), avatar);
        Ok(())
    }
}
