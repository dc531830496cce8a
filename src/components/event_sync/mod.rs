mod actor;
mod handle;
pub mod parser;
pub mod synchronizer;

pub use handle::EventSyncHandle;
pub use parser::{LineParser, MarkerMatch, ParsedEvent};
pub use synchronizer::{EventSynchronizer, SyncOutcome, SyncReport};
