pub mod adapter;
pub mod craigslist;
pub mod dob;
pub mod dohmh;
pub mod ecb;
pub mod fetch;
pub mod hpd;
pub mod profile;
pub mod reddit;
pub mod rss;
pub mod three11;
pub mod twitter;

pub use adapter::{FetchOutcome, PartitionOutcome, PartitionStatus, SourceAdapter};
pub use fetch::{BodyFetcher, HttpFetcher};
pub use profile::MonitorProfile;
