//! Container adapter, path sanitization and streaming extraction.
//!
//! # Architecture
//!
//! - `format.rs` - Extension and magic-byte detection, stream codecs
//! - `container/` - One walkable interface per container format
//! - `skip.rs` - Platform junk filtered from every walk
//! - `sanitize.rs` - Path sanitization (zip-slip prevention)
//! - `extract.rs` - Streaming extractor with byte progress
//! - `entry.rs`, `options.rs` - Shared types

pub use container::{Container, ContainerSource, Visit, open_container};
pub use entry::{ContainerEntry, EntryHeader, EntryKind, ExtractReport};
pub use error::{Error, Result};
pub use extract::{ExtractState, extract_archive, extract_container};
pub use format::{
    ArchiveFormat, Compression, SUPPORTED_EXTENSIONS, detect_format, is_supported_archive,
};
pub use options::{ExtractOptions, ExtractProgress, PermissionStrategy, ProgressFn};
pub use sanitize::{SanitizedPath, SanitizedRelativePath, sanitize_entry_name};

pub mod container;
pub mod entry;
mod error;
mod extract;
pub mod format;
pub mod options;
mod sanitize;
pub mod skip;
