use quiz_types::{AttemptId, OptionId, QuestionId};

#[derive(Debug, Clone, PartialEq)]
pub enum AttemptEvent {
    AttemptStarted {
        attempt_id: AttemptId,
        quiz_id: String,
        timed: bool,
    },
    OptionSelected {
        attempt_id: AttemptId,
        question_id: QuestionId,
        option_id: OptionId,
    },
    SelectionRejected {
        attempt_id: AttemptId,
        question_id: QuestionId,
    },
    TimerExpired {
        attempt_id: AttemptId,
    },
    AttemptSubmitted {
        attempt_id: AttemptId,
        percentage: u32,
        persisted: bool,
    },
    ReviewEntered {
        attempt_id: AttemptId,
        correct: u32,
        reviewed: u32,
    },
}

impl AttemptEvent {
    pub fn attempt_id(&self) -> AttemptId {
        match self {
            AttemptEvent::AttemptStarted { attempt_id, .. } => *attempt_id,
            AttemptEvent::OptionSelected { attempt_id, .. } => *attempt_id,
            AttemptEvent::SelectionRejected { attempt_id, .. } => *attempt_id,
            AttemptEvent::TimerExpired { attempt_id } => *attempt_id,
            AttemptEvent::AttemptSubmitted { attempt_id, .. } => *attempt_id,
            AttemptEvent::ReviewEntered { attempt_id, .. } => *attempt_id,
        }
    }
}

/// Event handler trait for observing attempt events
pub trait AttemptEventHandler: Send {
    fn handle_event(&mut self, event: AttemptEvent);
}

/// Simple event bus for distributing attempt events
pub struct AttemptEventBus {
    handlers: Vec<Box<dyn AttemptEventHandler>>,
}

impl AttemptEventBus {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn add_handler(&mut self, handler: Box<dyn AttemptEventHandler>) {
        self.handlers.push(handler);
    }

    pub fn publish(&mut self, event: AttemptEvent) {
        for handler in &mut self.handlers {
            handler.handle_event(event.clone());
        }
    }
}

impl Default for AttemptEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AttemptEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttemptEventBus")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
