pub mod artifacts;

pub use artifacts::{ArtifactStore, FsArtifactStore, InMemoryArtifactStore};
