mod bounded;
mod conversation;
mod learning;

pub use bounded::BoundedLog;
pub use conversation::{now_local_time, ConversationLog, Message, Sender};
pub use learning::{LearningLog, LearningRecord};

pub const DEFAULT_HISTORY_CAPACITY: usize = 100;
pub const DEFAULT_LEARNING_CAPACITY: usize = 100;
