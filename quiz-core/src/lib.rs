pub mod attempt;
pub mod attempt_events;
pub mod scoring;
pub mod session;
pub mod statistics;
pub mod timer;

// Re-export main components
pub use attempt::*;
pub use attempt_events::*;
pub use scoring::*;
pub use session::*;
pub use statistics::*;
pub use timer::*;
