//! Uniform request/retry/authentication layer shared by every provider
//! connector.

pub mod constants;
pub mod types;
pub mod transport;
pub mod normalizer;
pub mod executor;
#[cfg(any(test, feature = "test-util"))]
pub mod scripted;

pub use executor::{ConnectionCheck, RequestExecutor};
pub use normalizer::normalize;
#[cfg(any(test, feature = "test-util"))]
pub use scripted::{RecordedRequest, ScriptedTransport};
pub use transport::{RawResponse, ReqwestTransport, Transport};
pub use types::{
    Attachment, BasicAuth, Download, ExecutionResult, HttpMethod, Payload, RequestSpec,
    ResponseOptions, ResponseType,
};
