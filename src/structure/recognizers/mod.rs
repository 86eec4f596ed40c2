// ABOUTME: Built-in structure recognizers, ordered specific to generic.
// ABOUTME: Descriptor archives, suffix archives, descriptor files, directory fallback.

mod archive;
mod descriptor;
mod directory;
mod file;

pub use archive::ArchiveRecognizer;
pub use descriptor::DescriptorArchiveRecognizer;
pub use directory::DirectoryRecognizer;
pub use file::FileRecognizer;

/// Default relative orders; lower runs first, so the most specific
/// recognizer sits lowest and the generic directory fallback highest.
pub const ORDER_DESCRIPTOR_ARCHIVE: i32 = 1000;
pub const ORDER_ARCHIVE: i32 = 2000;
pub const ORDER_FILE: i32 = 3000;
pub const ORDER_DIRECTORY: i32 = 10_000;
