pub mod due;
pub mod forgetting;
pub mod memory;
pub mod scheduler;

pub use due::{due_cards, DueSet};
pub use forgetting::{next_interval, retrievability};
pub use memory::{update_memory, MemoryState};
pub use scheduler::Scheduler;
