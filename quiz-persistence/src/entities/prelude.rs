pub use super::history::Entity as History;
pub use super::settings::Entity as Settings;
pub use super::users::Entity as Users;
