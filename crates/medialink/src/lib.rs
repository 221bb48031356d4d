// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 The medialink Authors

//! medialink: V4L2 device probing and media-controller correlation
//!
//! This library discovers a hardware video device satisfying a caller-defined
//! acceptance test, then identifies the companion media-controller device that
//! exposes the same hardware through its topology graph, correlating the two
//! by kernel device-node identity rather than by path or name.
//!
//! # Quick Start
//!
//! ## Probing for a video device
//!
//! ```no_run
//! use medialink::{Capability, VideoDevice};
//!
//! // First memory-to-memory device in /dev, in listing order.
//! let video = VideoDevice::probe(|dev| {
//!     dev.capability().has(Capability::VIDEO_M2M | Capability::STREAMING)
//! })?;
//! println!("selected {} ({})", video.path().display(), video.capability());
//! # Ok::<(), medialink::Error>(())
//! ```
//!
//! ## Finding the companion media controller
//!
//! ```no_run
//! use medialink::{Capability, MediaDevice, VideoDevice};
//!
//! let video = VideoDevice::probe(|dev| dev.capability().has(Capability::VIDEO_M2M))?;
//! let media = MediaDevice::correlate(&video)?;
//! println!("{} is driven by {}", video.path().display(), media.path().display());
//! # Ok::<(), medialink::Error>(())
//! ```
//!
//! # Discovery model
//!
//! Both scans share the same shape: enumerate `/dev` entries by name prefix
//! (`video*`, `media*`) in filesystem order, open and query each candidate,
//! and return the first acceptable one with ownership of its descriptor.
//! Per-candidate failures (open refused, query not supported) are logged and
//! skipped; only a root directory that cannot be listed aborts a scan.
//! Rejected candidates have their descriptors closed before the scan
//! advances, so at most one descriptor per scan outlives the call: the
//! accepted one.
//!
//! Correlation is keyed on device-node identity, the (major, minor) pair of
//! the node a descriptor refers to. A media candidate matches when its
//! topology contains a video-kind interface whose devnode identity equals the
//! target's. Paths and card names never participate in matching.
//!
//! Everything is synchronous and blocking, with no timeouts: a hung driver
//! call blocks the caller. This is the documented contract, not an accident.

use std::collections::TryReserveError;
use std::error;
use std::fmt;
use std::io::Error as IoError;
use std::path::PathBuf;

mod io;
mod scan;
mod sys;

pub mod media;
pub mod topology;
pub mod video;

pub use media::MediaDevice;
pub use sys::{Capability, MediaInfo};
pub use topology::{DeviceNode, Interface, InterfaceKind};
pub use video::VideoDevice;

/// Default device filesystem root scanned by the convenience constructors.
pub const DEV_ROOT: &str = "/dev";

/// Error type for discovery operations.
///
/// Per-candidate failures never surface here; they are logged and skipped,
/// and only show up as [`Error::NoMatchingDevice`] once every candidate has
/// been tried. The original OS error is carried as the cause where one
/// exists.
#[derive(Debug)]
pub enum Error {
    /// The device directory could not be opened for listing. Fatal to the
    /// whole scan, as opposed to any single candidate.
    DirectoryUnavailable { root: PathBuf, source: IoError },

    /// The node-identity query on the correlation target failed; with no
    /// identity there is nothing to match against.
    NodeIdentity(IoError),

    /// A topology query round-trip failed (either phase).
    TopologyQuery(IoError),

    /// The interface buffer for a topology fetch could not be allocated.
    AllocationFailed(TryReserveError),

    /// Every candidate was tried and none was accepted or matched.
    NoMatchingDevice,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::DirectoryUnavailable { root, source } => {
                write!(f, "device directory {} unavailable: {}", root.display(), source)
            }
            Error::NodeIdentity(err) => write!(f, "node identity query failed: {}", err),
            Error::TopologyQuery(err) => write!(f, "media topology query failed: {}", err),
            Error::AllocationFailed(err) => {
                write!(f, "interface buffer allocation failed: {}", err)
            }
            Error::NoMatchingDevice => write!(f, "no matching device found"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::DirectoryUnavailable { source, .. } => Some(source),
            Error::NodeIdentity(err) => Some(err),
            Error::TopologyQuery(err) => Some(err),
            Error::AllocationFailed(err) => Some(err),
            Error::NoMatchingDevice => None,
        }
    }
}

impl From<TryReserveError> for Error {
    fn from(err: TryReserveError) -> Self {
        Error::AllocationFailed(err)
    }
}
