pub mod sync;

pub use sync::{StoreOutcome, StoreStatus, SyncOrchestrator, SyncReport};
