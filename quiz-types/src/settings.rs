use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Theme {
    Light,
    Dark,
}

macro_rules! string_enum {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text),+
                }
            }

            pub fn parse(value: &str) -> Option<Self> {
                match value {
                    $($text => Some($ty::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

string_enum!(Visibility { Public => "public", Private => "private" });
string_enum!(Theme { Light => "light", Dark => "dark" });

/// Per-account preferences, one-to-one with the account (keyed by email).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Settings {
    pub user_id: String,
    pub email_notifications: bool,
    pub quiz_reminders: bool,
    pub achievement_alerts: bool,
    pub profile_visibility: Visibility,
    pub show_on_leaderboard: bool,
    pub allow_messages: bool,
    pub theme: Theme,
}

impl Settings {
    pub fn defaults_for(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            email_notifications: true,
            quiz_reminders: true,
            achievement_alerts: true,
            profile_visibility: Visibility::Public,
            show_on_leaderboard: true,
            allow_messages: true,
            theme: Theme::Light,
        }
    }

    /// Partial merge: only the fields present in the patch change.
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(value) = patch.email_notifications {
            self.email_notifications = value;
        }
        if let Some(value) = patch.quiz_reminders {
            self.quiz_reminders = value;
        }
        if let Some(value) = patch.achievement_alerts {
            self.achievement_alerts = value;
        }
        if let Some(value) = patch.profile_visibility {
            self.profile_visibility = value;
        }
        if let Some(value) = patch.show_on_leaderboard {
            self.show_on_leaderboard = value;
        }
        if let Some(value) = patch.allow_messages {
            self.allow_messages = value;
        }
        if let Some(value) = patch.theme {
            self.theme = value;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export)]
pub struct SettingsPatch {
    pub email_notifications: Option<bool>,
    pub quiz_reminders: Option<bool>,
    pub achievement_alerts: Option<bool>,
    pub profile_visibility: Option<Visibility>,
    pub show_on_leaderboard: Option<bool>,
    pub allow_messages: Option<bool>,
    pub theme: Option<Theme>,
}
