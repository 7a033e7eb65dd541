pub mod types;
pub mod classification;
pub mod retry;

pub use types::{ErrorKind, VulnmapError};
pub use classification::ErrorClassification;
pub use retry::{RetryPolicy, with_retry};
