// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 The medialink Authors

//! Media-controller correlation.
//!
//! Given an already-open video device, [`MediaDevice::correlate`] finds the
//! media-controller node that drives the same hardware. The link between the
//! two is the video node's kernel identity: a media candidate matches when
//! its topology graph contains a video-kind interface whose devnode carries
//! the target's (major, minor) pair.

use std::fmt;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd, RawFd};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::io::{DeviceIo, Kernel};
use crate::scan;
use crate::sys::MediaInfo;
use crate::topology::{self, Interface, InterfaceKind};
use crate::video::VideoDevice;
use crate::Error;

const MEDIA_PREFIX: &str = "media";

/// A correlated media-controller device: its path, its open descriptor, and
/// the device-info record it reported.
///
/// Same ownership rule as [`VideoDevice`]: the descriptor belongs to the
/// handle from acceptance on and is closed exactly once, on drop.
pub struct MediaDevice {
    path: PathBuf,
    fd: OwnedFd,
    info: MediaInfo,
}

impl MediaDevice {
    /// Find the media controller in `/dev` whose topology references
    /// `video`'s device node.
    ///
    /// # Errors
    ///
    /// [`Error::NodeIdentity`] if the target's identity cannot be resolved
    /// (nothing to match against), [`Error::DirectoryUnavailable`] if the
    /// root cannot be listed, [`Error::NoMatchingDevice`] if no candidate's
    /// topology references the target. Candidates that fail to open, to
    /// answer the info query, or to deliver a topology are logged and
    /// skipped with their descriptors closed.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use medialink::{Capability, MediaDevice, VideoDevice};
    ///
    /// let video = VideoDevice::probe(|dev| dev.capability().has(Capability::VIDEO_M2M))?;
    /// let media = MediaDevice::correlate(&video)?;
    /// println!("request API target: {}", media.path().display());
    /// # Ok::<(), medialink::Error>(())
    /// ```
    pub fn correlate(video: &VideoDevice) -> Result<MediaDevice, Error> {
        Self::correlate_at(crate::DEV_ROOT, video)
    }

    /// Like [`correlate`](Self::correlate), but scanning `root` instead of
    /// `/dev`.
    pub fn correlate_at<P: AsRef<Path>>(root: P, video: &VideoDevice) -> Result<MediaDevice, Error> {
        correlate_with(&Kernel, root.as_ref(), video)
    }

    /// Path of the media node, e.g. `/dev/media1`.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The device-info record returned by the device.
    pub fn info(&self) -> &MediaInfo {
        &self.info
    }

    /// Re-fetch the interface table of this device.
    pub fn interfaces(&self) -> Result<Vec<Interface>, Error> {
        topology::fetch_interfaces(&Kernel, self.fd.as_fd())
    }

    /// Give up the handle, keeping the descriptor open for the pipeline.
    pub fn into_fd(self) -> OwnedFd {
        self.fd
    }
}

impl AsFd for MediaDevice {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl AsRawFd for MediaDevice {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

impl fmt::Debug for MediaDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaDevice")
            .field("path", &self.path)
            .field("info", &self.info)
            .finish()
    }
}

pub(crate) fn correlate_with<I: DeviceIo>(
    io: &I,
    root: &Path,
    target: &VideoDevice,
) -> Result<MediaDevice, Error> {
    let target_node = io
        .node_identity(target.as_fd())
        .map_err(Error::NodeIdentity)?;
    debug!(
        "video device {} is node {}",
        target.path().display(),
        target_node
    );

    for path in scan::candidates(root, MEDIA_PREFIX)? {
        debug!("probing media device {}", path.display());

        let fd = match io.open_media(&path) {
            Ok(fd) => fd,
            Err(err) => {
                debug!("{}: open failed: {}", path.display(), err);
                continue;
            }
        };

        let info = match io.query_media_info(fd.as_fd()) {
            Ok(info) => info,
            Err(err) => {
                debug!("{}: device info query failed: {}", path.display(), err);
                continue;
            }
        };

        // Topology and allocation failures alike end this candidate; either
        // way the descriptor drops closed before the scan advances.
        let interfaces = match topology::fetch_interfaces(io, fd.as_fd()) {
            Ok(interfaces) => interfaces,
            Err(err) => {
                debug!("{}: topology fetch failed: {}", path.display(), err);
                continue;
            }
        };

        let matched = interfaces
            .iter()
            .any(|i| i.kind == InterfaceKind::Video && i.devnode == target_node);
        if matched {
            info!(
                "using media device {} for video node {}",
                path.display(),
                target_node
            );
            return Ok(MediaDevice { path, fd, info });
        }
    }

    Err(Error::NoMatchingDevice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::mock::{open_fd_count, Script, ScratchDir, ScriptedIo};
    use crate::sys::{self, Capability};
    use crate::topology::DeviceNode;
    use crate::video;
    use serial_test::serial;
    use std::collections::HashMap;

    const TARGET: DeviceNode = DeviceNode {
        major: 81,
        minor: 5,
    };
    const OTHER: DeviceNode = DeviceNode {
        major: 81,
        minor: 9,
    };

    /// A scripted video device accepted out of a one-entry namespace, so the
    /// correlation target carries a real descriptor the mock can resolve.
    fn scripted_target(dir: &ScratchDir, io_scripts: &mut HashMap<PathBuf, Script>) -> PathBuf {
        let path = dir.file("video5");
        io_scripts.insert(
            path.clone(),
            Script {
                capability: Some(Capability::with_node_caps(Capability::VIDEO_M2M)),
                identity: Some(TARGET),
                ..Script::default()
            },
        );
        path
    }

    fn probe_target(io: &ScriptedIo, dir: &ScratchDir) -> VideoDevice {
        video::probe_with(io, &dir.0, |_| true).unwrap()
    }

    #[test]
    #[serial]
    fn test_correlate_matches_by_node_identity() {
        let dir = ScratchDir::new("correlate-match");
        let mut scripts = HashMap::new();
        scripted_target(&dir, &mut scripts);

        // media0 references an unrelated node, media1 references the target.
        scripts.insert(
            dir.file("media0"),
            Script {
                media_info: Some(MediaInfo::default()),
                interfaces: Some(vec![(sys::MEDIA_INTF_T_V4L_VIDEO, OTHER)]),
                ..Script::default()
            },
        );
        let media1 = dir.file("media1");
        scripts.insert(
            media1.clone(),
            Script {
                media_info: Some(MediaInfo::default()),
                interfaces: Some(vec![
                    (0x100, TARGET),
                    (sys::MEDIA_INTF_T_V4L_VIDEO, OTHER),
                    (sys::MEDIA_INTF_T_V4L_VIDEO, TARGET),
                ]),
                ..Script::default()
            },
        );
        let io = ScriptedIo::new(scripts);
        let target = probe_target(&io, &dir);

        let before = open_fd_count();
        let media = correlate_with(&io, &dir.0, &target).unwrap();

        assert_eq!(media.path(), media1);
        // Only the matched candidate's descriptor survives.
        assert_eq!(open_fd_count(), before + 1);
        drop(media);
        assert_eq!(open_fd_count(), before);
    }

    #[test]
    #[serial]
    fn test_correlate_ignores_non_video_interfaces() {
        let dir = ScratchDir::new("correlate-kind");
        let mut scripts = HashMap::new();
        scripted_target(&dir, &mut scripts);

        // The target identity appears only on a non-video interface; that
        // must not count as a match.
        scripts.insert(
            dir.file("media0"),
            Script {
                media_info: Some(MediaInfo::default()),
                interfaces: Some(vec![(0x100, TARGET)]),
                ..Script::default()
            },
        );
        let io = ScriptedIo::new(scripts);
        let target = probe_target(&io, &dir);

        let result = correlate_with(&io, &dir.0, &target);
        assert!(matches!(result, Err(Error::NoMatchingDevice)));
    }

    #[test]
    #[serial]
    fn test_correlate_empty_namespace_is_not_found() {
        let dir = ScratchDir::new("correlate-empty");
        let mut scripts = HashMap::new();
        scripted_target(&dir, &mut scripts);
        let io = ScriptedIo::new(scripts);
        let target = probe_target(&io, &dir);

        let before = open_fd_count();
        let result = correlate_with(&io, &dir.0, &target);

        assert!(matches!(result, Err(Error::NoMatchingDevice)));
        assert_eq!(open_fd_count(), before);
    }

    #[test]
    #[serial]
    fn test_correlate_skips_candidate_failures() {
        let dir = ScratchDir::new("correlate-skip");
        let mut scripts = HashMap::new();
        scripted_target(&dir, &mut scripts);

        scripts.insert(
            dir.file("media0"),
            Script {
                open_fails: true,
                ..Script::default()
            },
        );
        // Info query fails.
        scripts.insert(dir.file("media1"), Script::default());
        // Topology fetch fails after a successful info query.
        scripts.insert(
            dir.file("media2"),
            Script {
                media_info: Some(MediaInfo::default()),
                ..Script::default()
            },
        );
        let media3 = dir.file("media3");
        scripts.insert(
            media3.clone(),
            Script {
                media_info: Some(MediaInfo::default()),
                interfaces: Some(vec![(sys::MEDIA_INTF_T_V4L_VIDEO, TARGET)]),
                ..Script::default()
            },
        );
        let io = ScriptedIo::new(scripts);
        let target = probe_target(&io, &dir);

        let before = open_fd_count();
        let media = correlate_with(&io, &dir.0, &target).unwrap();

        assert_eq!(media.path(), media3);
        assert_eq!(open_fd_count(), before + 1);
    }

    #[test]
    #[serial]
    fn test_correlate_closes_candidate_on_oversized_topology() {
        let dir = ScratchDir::new("correlate-alloc");
        let mut scripts = HashMap::new();
        scripted_target(&dir, &mut scripts);

        // A phase-1 count no allocator can satisfy: the allocation failure
        // must skip the candidate, not leak its descriptor or abort.
        scripts.insert(
            dir.file("media0"),
            Script {
                media_info: Some(MediaInfo::default()),
                interfaces: Some(vec![(sys::MEDIA_INTF_T_V4L_VIDEO, TARGET)]),
                probe_count: Some(usize::MAX),
                ..Script::default()
            },
        );
        let io = ScriptedIo::new(scripts);
        let target = probe_target(&io, &dir);

        let before = open_fd_count();
        let result = correlate_with(&io, &dir.0, &target);

        assert!(matches!(result, Err(Error::NoMatchingDevice)));
        assert_eq!(open_fd_count(), before);
    }

    #[test]
    #[serial]
    fn test_correlate_survives_count_drift() {
        let dir = ScratchDir::new("correlate-drift");
        let mut scripts = HashMap::new();
        scripted_target(&dir, &mut scripts);

        // The device lost an interface between the phases; the shortened
        // table still contains the target.
        scripts.insert(
            dir.file("media0"),
            Script {
                media_info: Some(MediaInfo::default()),
                interfaces: Some(vec![
                    (sys::MEDIA_INTF_T_V4L_VIDEO, TARGET),
                    (sys::MEDIA_INTF_T_V4L_VIDEO, OTHER),
                ]),
                probe_count: Some(3),
                fill_count: Some(2),
                ..Script::default()
            },
        );
        let io = ScriptedIo::new(scripts);
        let target = probe_target(&io, &dir);

        let media = correlate_with(&io, &dir.0, &target).unwrap();
        assert_eq!(media.path(), dir.0.join("media0"));
    }

    #[test]
    #[serial]
    fn test_correlate_target_without_identity_is_fatal() {
        let dir = ScratchDir::new("correlate-noident");
        let mut scripts = HashMap::new();
        let path = dir.file("video5");
        scripts.insert(
            path,
            Script {
                capability: Some(Capability::with_node_caps(Capability::VIDEO_M2M)),
                ..Script::default()
            },
        );
        let io = ScriptedIo::new(scripts);
        let target = probe_target(&io, &dir);

        let result = correlate_with(&io, &dir.0, &target);
        assert!(matches!(result, Err(Error::NodeIdentity(_))));
    }
}
