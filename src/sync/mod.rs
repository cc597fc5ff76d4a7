pub mod engine;
pub mod handle;
pub mod state;

pub use engine::{NotificationSync, SyncOptions};
pub use handle::SyncHandle;
pub use state::{MergePolicy, NotificationState, ReadUndo};
