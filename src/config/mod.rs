pub mod credentials;
pub mod parser;
pub mod schema;
pub mod types;

pub use credentials::{mask_key, redact_credentials, resolve_credential};
pub use parser::{load_config, parse_config, parse_config_str, schema_warnings, validate_config};
pub use types::*;
