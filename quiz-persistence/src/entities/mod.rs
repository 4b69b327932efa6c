pub mod prelude;

pub mod history;
pub mod settings;
pub mod users;
