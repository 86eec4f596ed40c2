// ABOUTME: Structure determination: recursive classification of container trees.
// ABOUTME: Exports metadata types, the recognizer trait, built-ins, and the resolver.

mod error;
mod metadata;
mod recognizer;
pub mod recognizers;
mod resolver;

pub use error::StructureError;
pub use metadata::{
    ClasspathEntry, ContextInfo, MetadataKind, MetadataLocation, ModificationType,
    StructureMetaData,
};
pub use recognizer::{StructureContext, StructureRecognizer};
pub use resolver::{StructureListener, StructureResolver};

/// Attachment name under which a unit's own `ContextInfo` is predetermined.
pub const CONTEXT_INFO_ATTACHMENT: &str = "structure.context-info";

/// Attachment name under which the root unit carries the frozen
/// `StructureMetaData` for the whole deployment.
pub const STRUCTURE_ATTACHMENT: &str = "structure.metadata";
