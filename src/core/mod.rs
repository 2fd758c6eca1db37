//! Core records, error taxonomy and collaborator abstractions

pub mod config;
pub mod error;
pub mod fetch;
pub mod history;
pub mod log;
pub mod profile;
pub mod sink;

// Re-export main types for cleaner imports
pub use error::{ErrorKind, ExtractError, FetchError, Stage, StageContext};
pub use fetch::PageFetcher;
pub use history::{DividendEvent, HistorySource, NavPoint, SplitEvent};
pub use profile::{BasicInfo, ClosedPeriod, FundListing, FundProfile, RedemptionInfo};
pub use sink::FundSink;
