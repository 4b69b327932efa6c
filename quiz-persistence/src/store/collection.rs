use sea_orm::EntityTrait;
use std::fmt;

use crate::entities::{history, settings, users};

/// Secondary index names, as accepted by `get_by_index`.
pub mod index {
    pub const USERNAME: &str = "username";
    pub const CREATED_AT: &str = "createdAt";
    pub const USER_ID: &str = "userId";
    pub const DATE: &str = "date";
    pub const CATEGORY: &str = "category";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionName {
    Users,
    Settings,
    History,
}

impl CollectionName {
    pub const ALL: [CollectionName; 3] = [
        CollectionName::Users,
        CollectionName::Settings,
        CollectionName::History,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionName::Users => "users",
            CollectionName::Settings => "settings",
            CollectionName::History => "history",
        }
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, primary-keyed group of records backed by one entity.
pub trait Collection: EntityTrait {
    const NAME: CollectionName;

    /// Column behind a declared secondary index.
    fn index_column(index: &str) -> Option<Self::Column>;
}

impl Collection for users::Entity {
    const NAME: CollectionName = CollectionName::Users;

    fn index_column(index: &str) -> Option<users::Column> {
        match index {
            index::USERNAME => Some(users::Column::Username),
            index::CREATED_AT => Some(users::Column::CreatedAt),
            _ => None,
        }
    }
}

impl Collection for settings::Entity {
    const NAME: CollectionName = CollectionName::Settings;

    fn index_column(_index: &str) -> Option<settings::Column> {
        None
    }
}

impl Collection for history::Entity {
    const NAME: CollectionName = CollectionName::History;

    fn index_column(index: &str) -> Option<history::Column> {
        match index {
            index::USER_ID => Some(history::Column::UserId),
            index::DATE => Some(history::Column::Date),
            index::CATEGORY => Some(history::Column::Category),
            _ => None,
        }
    }
}
