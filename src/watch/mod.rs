// src/watch/mod.rs

//! Change detection for the source (and rendered) config files.
//!
//! Detection is poll based: every tick the source file is read and hashed,
//! and the digest is compared with the last one that was processed. Content
//! digests rather than modification times are compared, so touching a file
//! without changing it never causes a reload.

pub mod detector;
pub mod hash;

pub use detector::{Change, ChangeDetector, SourceContent};
pub use hash::{compute_digest, compute_file_digest};
