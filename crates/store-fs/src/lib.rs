mod error;
mod records;
mod store;

pub use error::{Result, StoreFsError};
pub use records::{EntryRecord, ProgressRecord, TrackRecord};
pub use store::FsStore;
