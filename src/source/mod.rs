pub mod fetcher;
pub mod locator;
pub mod record;

pub use fetcher::{FetchError, LogFetcher};
pub use locator::FileLocator;
pub use record::{ChatRecord, Parsed, PatternError, RecordParser};
