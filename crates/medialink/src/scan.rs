// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 The medialink Authors

//! Device-filesystem enumeration shared by the video and media scans.

use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use crate::Error;

/// Lazily yield the full path of every entry under `root` whose name starts
/// with `prefix`, in whatever order the directory listing produces them.
///
/// The order is not sorted and not stable across calls; the probe and
/// correlate scans take the first acceptable candidate in this order, so
/// downstream behavior is deliberately listing-order dependent. A root that
/// cannot be listed is fatal; entries that cannot be read are skipped, the
/// same as any other per-candidate failure.
pub(crate) fn candidates(
    root: &Path,
    prefix: &'static str,
) -> Result<impl Iterator<Item = PathBuf>, Error> {
    let dir = fs::read_dir(root).map_err(|source| Error::DirectoryUnavailable {
        root: root.to_path_buf(),
        source,
    })?;

    Ok(dir.filter_map(move |entry| {
        let entry = entry.ok()?;
        let name = entry.file_name();
        if name.as_bytes().starts_with(prefix.as_bytes()) {
            Some(entry.path())
        } else {
            None
        }
    }))
}
