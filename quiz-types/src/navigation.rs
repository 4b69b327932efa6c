use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Where the page collaborator should go next. The core only names the
/// destination; routing is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Destination {
    Home,
    Login,
    Profile,
    Quiz { quiz_id: String },
    Results,
}
