pub mod attempt;
pub mod errors;
pub mod history;
pub mod navigation;
pub mod settings;
pub mod user;

// Re-export all types
pub use attempt::*;
pub use errors::*;
pub use history::*;
pub use navigation::*;
pub use settings::*;
pub use user::*;

/// Accounts are keyed by their email address.
pub type AccountId = String;
pub type QuestionId = String;
pub type OptionId = String;
pub type AttemptId = uuid::Uuid;
