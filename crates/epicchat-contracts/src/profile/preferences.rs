use std::fmt;

use anyhow::bail;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub theme: Theme,
    pub avatar_style: String,
    pub voice: String,
    pub show_timestamps: bool,
    pub speech_recognition: bool,
    pub notification_sounds: bool,
    pub auto_scroll: bool,
    pub learning_rate: i64,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            avatar_style: "realistic".to_string(),
            voice: "female".to_string(),
            show_timestamps: true,
            speech_recognition: true,
            notification_sounds: true,
            auto_scroll: true,
            learning_rate: 5,
        }
    }
}

impl Preferences {
    /// Overlay a stored preferences object on the defaults. Unknown keys are
    /// ignored and keys with the wrong type keep their default.
    pub fn merged(stored: &Value) -> Self {
        let mut prefs = Self::default();
        let Some(obj) = stored.as_object() else {
            return prefs;
        };

        prefs.theme = obj
            .get("theme")
            .and_then(Value::as_str)
            .and_then(Theme::parse)
            .unwrap_or(prefs.theme);
        prefs.avatar_style = string_field(obj, "avatarStyle").unwrap_or(prefs.avatar_style);
        prefs.voice = string_field(obj, "voice").unwrap_or(prefs.voice);
        prefs.show_timestamps = bool_field(obj, "showTimestamps").unwrap_or(prefs.show_timestamps);
        prefs.speech_recognition =
            bool_field(obj, "speechRecognition").unwrap_or(prefs.speech_recognition);
        prefs.notification_sounds =
            bool_field(obj, "notificationSounds").unwrap_or(prefs.notification_sounds);
        prefs.auto_scroll = bool_field(obj, "autoScroll").unwrap_or(prefs.auto_scroll);
        // The settings form historically stored the slider value as a string.
        prefs.learning_rate = obj
            .get("learningRate")
            .and_then(|value| {
                value
                    .as_i64()
                    .or_else(|| value.as_str().and_then(|raw| raw.trim().parse().ok()))
            })
            .unwrap_or(prefs.learning_rate);
        prefs
    }

    /// Set one preference from user text. Accepts the stored camelCase key or
    /// its snake_case spelling.
    pub fn set(&mut self, key: &str, raw: &str) -> anyhow::Result<()> {
        let raw = raw.trim();
        match normalize_key(key).as_str() {
            "theme" => match Theme::parse(raw) {
                Some(theme) => self.theme = theme,
                None => bail!("theme must be 'light' or 'dark', got '{raw}'"),
            },
            "avatarstyle" => self.avatar_style = non_empty(key, raw)?,
            "voice" => self.voice = non_empty(key, raw)?,
            "showtimestamps" => self.show_timestamps = parse_flag(key, raw)?,
            "speechrecognition" => self.speech_recognition = parse_flag(key, raw)?,
            "notificationsounds" => self.notification_sounds = parse_flag(key, raw)?,
            "autoscroll" => self.auto_scroll = parse_flag(key, raw)?,
            "learningrate" => match raw.parse::<i64>() {
                Ok(value) => self.learning_rate = value,
                Err(_) => bail!("learningRate must be an integer, got '{raw}'"),
            },
            _ => bail!("unknown preference '{key}'"),
        }
        Ok(())
    }

    /// Display order matches the settings form.
    pub fn entries(&self) -> IndexMap<&'static str, Value> {
        let mut entries = IndexMap::new();
        entries.insert("theme", Value::String(self.theme.to_string()));
        entries.insert("avatarStyle", Value::String(self.avatar_style.clone()));
        entries.insert("voice", Value::String(self.voice.clone()));
        entries.insert("showTimestamps", Value::Bool(self.show_timestamps));
        entries.insert("speechRecognition", Value::Bool(self.speech_recognition));
        entries.insert("notificationSounds", Value::Bool(self.notification_sounds));
        entries.insert("autoScroll", Value::Bool(self.auto_scroll));
        entries.insert("learningRate", Value::from(self.learning_rate));
        entries
    }
}

fn normalize_key(key: &str) -> String {
    key.trim()
        .chars()
        .filter(|ch| *ch != '_' && *ch != '-')
        .collect::<String>()
        .to_ascii_lowercase()
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

fn bool_field(obj: &Map<String, Value>, key: &str) -> Option<bool> {
    obj.get(key).and_then(Value::as_bool)
}

fn non_empty(key: &str, raw: &str) -> anyhow::Result<String> {
    if raw.is_empty() {
        bail!("{key} cannot be empty");
    }
    Ok(raw.to_string())
}

fn parse_flag(key: &str, raw: &str) -> anyhow::Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => bail!("{key} expects on/off, got '{raw}'"),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Preferences, Theme};

    #[test]
    fn merged_overrides_only_present_keys() {
        let prefs = Preferences::merged(&json!({"theme": "dark", "autoScroll": false}));
        assert_eq!(prefs.theme, Theme::Dark);
        assert!(!prefs.auto_scroll);
        assert_eq!(prefs.voice, "female");
        assert_eq!(prefs.learning_rate, 5);
    }

    #[test]
    fn merged_ignores_unknown_and_mistyped_keys() {
        let prefs = Preferences::merged(&json!({
            "theme": "neon",
            "showTimestamps": "yes",
            "fontSize": 18,
            "learningRate": "8",
        }));
        assert_eq!(prefs.theme, Theme::Light);
        assert!(prefs.show_timestamps);
        assert_eq!(prefs.learning_rate, 8);
    }

    #[test]
    fn merged_non_object_is_default() {
        assert_eq!(Preferences::merged(&json!([1, 2])), Preferences::default());
        assert_eq!(Preferences::merged(&json!(null)), Preferences::default());
    }

    #[test]
    fn serialize_uses_stored_key_names() -> anyhow::Result<()> {
        let value = serde_json::to_value(Preferences::default())?;
        assert_eq!(value["avatarStyle"], json!("realistic"));
        assert_eq!(value["learningRate"], json!(5));
        assert_eq!(value["theme"], json!("light"));
        assert_eq!(Preferences::merged(&value), Preferences::default());
        Ok(())
    }

    #[test]
    fn set_accepts_both_key_spellings() -> anyhow::Result<()> {
        let mut prefs = Preferences::default();
        prefs.set("auto_scroll", "off")?;
        prefs.set("learningRate", "9")?;
        prefs.set("theme", "DARK")?;
        assert!(!prefs.auto_scroll);
        assert_eq!(prefs.learning_rate, 9);
        assert_eq!(prefs.theme, Theme::Dark);
        Ok(())
    }

    #[test]
    fn set_rejects_bad_input() {
        let mut prefs = Preferences::default();
        assert!(prefs.set("volume", "11").is_err());
        assert!(prefs.set("showTimestamps", "maybe").is_err());
        assert!(prefs.set("learningRate", "fast").is_err());
        assert_eq!(prefs, Preferences::default());
    }

    #[test]
    fn entries_follow_form_order() {
        let keys: Vec<&str> = Preferences::default().entries().keys().copied().collect();
        assert_eq!(
            keys,
            vec![
                "theme",
                "avatarStyle",
                "voice",
                "showTimestamps",
                "speechRecognition",
                "notificationSounds",
                "autoScroll",
                "learningRate"
            ]
        );
    }

    #[test]
    fn theme_toggles() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
    }
}
