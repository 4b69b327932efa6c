use serde::{Deserialize, Serialize};
use ts_rs::TS;
use validator::Validate;

/// An account as handed to callers. The stored credential never leaves the
/// persistence layer, so it has no field here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Account {
    pub email: String,
    pub username: String,
    pub display_name: String,
    pub avatar: String,
    pub created_at: String, // ISO 8601 string
    pub last_login: String, // ISO 8601 string
    pub last_attempt_at: Option<String>,
    pub stats: AccountStats,
}

/// Derived statistics. Only the attempt-recording path writes these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AccountStats {
    pub total_quizzes: u32,
    pub average_score: u32, // 0..=100
    pub total_time_seconds: u32,
    pub rank: u32,
    pub streak: u32,
    pub level: u32,
}

impl AccountStats {
    pub const UNRANKED: u32 = 999;

    /// Stats of a freshly registered account.
    pub fn new_account() -> Self {
        Self {
            total_quizzes: 0,
            average_score: 0,
            total_time_seconds: 0,
            rank: Self::UNRANKED,
            streak: 0,
            level: 1,
        }
    }
}

impl Default for AccountStats {
    fn default() -> Self {
        Self::new_account()
    }
}

/// Field-level profile update. Email and credential are not patchable here;
/// unknown fields in a serialized patch are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export)]
pub struct ProfilePatch {
    pub display_name: Option<String>,
    pub username: Option<String>,
    pub avatar: Option<String>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.username.is_none() && self.avatar.is_none()
    }
}

/// The identity record exchanged with the page collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Identity {
    pub email: String,
    pub username: String,
    pub display_name: String,
}

impl From<&Account> for Identity {
    fn from(account: &Account) -> Self {
        Identity {
            email: account.email.clone(),
            username: account.username.clone(),
            display_name: account.display_name.clone(),
        }
    }
}

/// Sign-up form input.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, TS)]
#[ts(export)]
pub struct Registration {
    #[validate(email(message = "Please enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 4, max = 128, message = "Password must be at least 4 characters."))]
    pub credential: String,
    #[validate(length(min = 1, max = 100, message = "Display name is required."))]
    pub display_name: String,
}

impl Registration {
    pub fn new(email: &str, credential: &str, display_name: &str) -> Self {
        Self {
            email: email.trim().to_string(),
            credential: credential.to_string(),
            display_name: display_name.trim().to_string(),
        }
    }

    /// First word of the display name, falling back to the email's local part.
    pub fn derived_username(&self) -> String {
        self.display_name
            .split_whitespace()
            .next()
            .map(str::to_string)
            .unwrap_or_else(|| {
                self.email
                    .split('@')
                    .next()
                    .unwrap_or_default()
                    .to_string()
            })
    }
}

/// Credential change form input.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, TS)]
#[ts(export)]
pub struct CredentialChange {
    pub current: String,
    #[validate(length(min = 8, max = 128, message = "Password must be at least 8 characters."))]
    pub new: String,
}
