//! 基础设施层：ID、持久化、压缩包

pub mod archive;
pub mod id_generator;
pub mod persistence;

pub use archive::{ArchiveBuilder, ZipArchiveBuilder};
pub use id_generator::{new_id, IdGenerator, SequentialGenerator, UuidGenerator};
pub use persistence::{JsonFileStore, MemorySnapshotStore, SnapshotStore};
