// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 The medialink Authors

//! Video device probing.
//!
//! [`VideoDevice::probe`] scans the device filesystem for `video*` nodes,
//! queries each one's capabilities, and hands every successfully queried
//! candidate to an acceptance predicate. The first accepted candidate wins;
//! there is no attempt to rank multiple acceptable devices.

use std::fmt;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd, RawFd};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::io::{DeviceIo, Kernel};
use crate::scan;
use crate::sys::Capability;
use crate::topology::DeviceNode;
use crate::Error;

const VIDEO_PREFIX: &str = "video";

/// An accepted video device: its path, its open descriptor, and the
/// capability record that was handed to the predicate.
///
/// The descriptor is owned by the handle from the moment of acceptance and
/// closed when the handle is dropped; the library never closes it again.
pub struct VideoDevice {
    path: PathBuf,
    fd: OwnedFd,
    capability: Capability,
}

impl VideoDevice {
    /// Probe `/dev` for the first video device the predicate accepts.
    ///
    /// The predicate is called once per candidate that survived open and
    /// capability query, in directory listing order, and must not retain the
    /// candidate beyond the call (the borrow enforces this); state it needs
    /// travels in its captures. Candidates it rejects are closed before the
    /// scan advances.
    ///
    /// # Errors
    ///
    /// [`Error::DirectoryUnavailable`] if the root cannot be listed,
    /// [`Error::NoMatchingDevice`] if every candidate was tried without an
    /// acceptance. Candidates that fail to open or to answer the capability
    /// query are logged and skipped, not reported.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use medialink::{Capability, VideoDevice};
    ///
    /// let decoder = VideoDevice::probe(|dev| {
    ///     dev.capability().has(Capability::VIDEO_M2M_MPLANE)
    /// })?;
    /// # Ok::<(), medialink::Error>(())
    /// ```
    pub fn probe<F>(accept: F) -> Result<VideoDevice, Error>
    where
        F: FnMut(&VideoDevice) -> bool,
    {
        Self::probe_at(crate::DEV_ROOT, accept)
    }

    /// Like [`probe`](Self::probe), but scanning `root` instead of `/dev`.
    pub fn probe_at<P, F>(root: P, accept: F) -> Result<VideoDevice, Error>
    where
        P: AsRef<Path>,
        F: FnMut(&VideoDevice) -> bool,
    {
        probe_with(&Kernel, root.as_ref(), accept)
    }

    /// Path of the device node, e.g. `/dev/video12`.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The capability record returned by the device.
    pub fn capability(&self) -> &Capability {
        &self.capability
    }

    /// Identity of the device node this handle refers to.
    pub fn node_identity(&self) -> Result<DeviceNode, Error> {
        Kernel
            .node_identity(self.fd.as_fd())
            .map_err(Error::NodeIdentity)
    }

    /// Give up the handle, keeping the descriptor open for the pipeline that
    /// will drive the device.
    pub fn into_fd(self) -> OwnedFd {
        self.fd
    }
}

impl AsFd for VideoDevice {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl AsRawFd for VideoDevice {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

impl fmt::Debug for VideoDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoDevice")
            .field("path", &self.path)
            .field("capability", &self.capability)
            .finish()
    }
}

pub(crate) fn probe_with<I, F>(io: &I, root: &Path, mut accept: F) -> Result<VideoDevice, Error>
where
    I: DeviceIo,
    F: FnMut(&VideoDevice) -> bool,
{
    for path in scan::candidates(root, VIDEO_PREFIX)? {
        debug!("probing video device {}", path.display());

        let fd = match io.open_video(&path) {
            Ok(fd) => fd,
            Err(err) => {
                debug!("{}: open failed: {}", path.display(), err);
                continue;
            }
        };

        let capability = match io.query_capability(fd.as_fd()) {
            Ok(cap) => cap,
            Err(err) => {
                // fd drops here, closing the candidate before the skip.
                debug!("{}: capability query failed: {}", path.display(), err);
                continue;
            }
        };

        let candidate = VideoDevice {
            path,
            fd,
            capability,
        };
        if accept(&candidate) {
            info!("using video device {}", candidate.path.display());
            return Ok(candidate);
        }
        // Rejected candidate drops here, closing its descriptor.
    }

    Err(Error::NoMatchingDevice)
}
