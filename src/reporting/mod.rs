pub mod writer;

pub use writer::{publish_artifacts, to_pretty_json, write_artifacts, ArtifactKind, WrittenArtifact};
