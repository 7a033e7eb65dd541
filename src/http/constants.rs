pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_RETRY_BACKOFF_SECS: u64 = 15;
pub const DEFAULT_RETRY_COUNT: u32 = 0;
pub const MAX_RETRY_COUNT: u32 = 10;
pub const MAX_RETRY_BACKOFF_SECS: u64 = 60;

/// Structured generation is slow; chat calls get a much larger budget.
pub const CHAT_TIMEOUT_SECS: u64 = 600;

pub const NO_DATA_RETURNED: &str = "No content returned";
pub const INVALID_METHOD: &str = "Invalid method requested";
pub const AUTH_SUCCESSFUL: &str = "Authentication successful";
pub const AUTH_FAILED: &str = "Authentication failed";
pub const CONNECTION_FAILED: &str = "Connection could not be made to the server";
pub const CREDENTIALS_VALID: &str = "Credentials valid and can perform API calls";

/// Upper bound on how much of an error body is echoed into a message.
pub const MAX_ERROR_BODY_CHARS: usize = 2_000;
