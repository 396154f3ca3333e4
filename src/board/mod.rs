//! The ticket board: partition, progress, state store and drag handling

pub mod drag;
pub mod model;
pub mod progress;
pub mod store;

pub use drag::{DragController, DragGestures, DropOutcome};
pub use model::{Board, COLUMNS, DragIntent, ENTRY_STATUS};
pub use progress::ProgressSummary;
pub use store::{BoardStore, LoadOutcome};
