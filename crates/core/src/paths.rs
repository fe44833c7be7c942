// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directory-key canonicalization shared by the lock manager and fuse engine.
//!
//! Open question resolved here (see DESIGN.md): we normalize to an absolute
//! path with symlinks left intact and no trailing separator, rather than
//! following symlinks. Users name directories the way they typed them; two
//! different symlinks into the same target should not collide.

use std::path::{Path, PathBuf};

/// Normalize a directory path to the key used by the lock manager and fuse
/// engine: absolute, no trailing separator, symlinks unresolved.
pub fn canonical_dir(dir: &Path) -> PathBuf {
    let absolute = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(dir))
            .unwrap_or_else(|_| dir.to_path_buf())
    };

    strip_trailing_separators(&absolute)
}

fn strip_trailing_separators(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    let trimmed = s.trim_end_matches('/');
    if trimmed.is_empty() {
        PathBuf::from("/")
    } else {
        PathBuf::from(trimmed)
    }
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
