//! Filesystem primitives shared by the arcsort pipeline.
//!
//! - `dir.rs` - idempotent, race-safe directory creation
//! - `copy.rs` - durable read-then-write copy with a collision policy
//! - `permissions.rs` - permission modes for extracted entries
//! - `workspace.rs` - per-job private temporary directory

mod copy;
mod dir;
mod error;
pub mod permissions;
mod workspace;

pub use copy::{ConflictPolicy, copy_durable};
pub use dir::{ensure_dir, ensure_parent};
pub use error::{Error, Result};
pub use permissions::PermissionMode;
pub use workspace::{WORKSPACE_PREFIX, Workspace};
