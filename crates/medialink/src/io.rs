// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 The medialink Authors

//! Platform seam between the discovery scans and the kernel.
//!
//! The scans in [`crate::video`] and [`crate::media`] are written against
//! [`DeviceIo`] so the candidate-evaluation logic can be exercised with a
//! scripted double; [`Kernel`] is the production implementation issuing the
//! real syscalls.

use std::ffi::CString;
use std::io;
use std::mem;
use std::os::fd::{AsRawFd, BorrowedFd, FromRawFd, OwnedFd};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use crate::sys;
use crate::topology::DeviceNode;

/// The kernel calls the discovery scans depend on.
///
/// One method per query protocol of the external contract, plus the two open
/// flavors (video nodes are opened non-blocking, media nodes are not). Every
/// call is synchronous and blocking; no timeouts are applied.
pub(crate) trait DeviceIo {
    fn open_video(&self, path: &Path) -> io::Result<OwnedFd>;

    fn open_media(&self, path: &Path) -> io::Result<OwnedFd>;

    /// `VIDIOC_QUERYCAP` round-trip.
    fn query_capability(&self, fd: BorrowedFd<'_>) -> io::Result<sys::Capability>;

    /// `MEDIA_IOC_DEVICE_INFO` round-trip.
    fn query_media_info(&self, fd: BorrowedFd<'_>) -> io::Result<sys::MediaInfo>;

    /// Raw `MEDIA_IOC_G_TOPOLOGY` round-trip. With an empty buffer this is
    /// the size probe; with a buffer attached the kernel fills it. Returns
    /// the kernel-reported interface count, which may differ from `buf.len()`
    /// if the device was reconfigured between calls.
    fn query_topology(
        &self,
        fd: BorrowedFd<'_>,
        buf: &mut [sys::MediaInterface],
    ) -> io::Result<usize>;

    /// Identity of the device node the descriptor refers to: `st_rdev` of
    /// `fstat(2)`, never `st_dev` (the latter identifies the filesystem the
    /// node lives on, not the device behind it).
    fn node_identity(&self, fd: BorrowedFd<'_>) -> io::Result<DeviceNode>;
}

/// Production [`DeviceIo`] backed by `open(2)`/`ioctl(2)`/`fstat(2)`.
pub(crate) struct Kernel;

fn open_raw(path: &Path, flags: libc::c_int) -> io::Result<OwnedFd> {
    let cpath = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let fd = unsafe { libc::open(cpath.as_ptr(), flags) };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(unsafe { OwnedFd::from_raw_fd(fd) })
}

impl DeviceIo for Kernel {
    fn open_video(&self, path: &Path) -> io::Result<OwnedFd> {
        // Non-blocking so a stuck capture queue cannot wedge the open itself.
        open_raw(path, libc::O_RDWR | libc::O_NONBLOCK)
    }

    fn open_media(&self, path: &Path) -> io::Result<OwnedFd> {
        open_raw(path, libc::O_RDWR)
    }

    fn query_capability(&self, fd: BorrowedFd<'_>) -> io::Result<sys::Capability> {
        let mut cap = sys::Capability::default();
        let ret = unsafe {
            libc::ioctl(
                fd.as_raw_fd(),
                sys::VIDIOC_QUERYCAP,
                &mut cap as *mut sys::Capability,
            )
        };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(cap)
    }

    fn query_media_info(&self, fd: BorrowedFd<'_>) -> io::Result<sys::MediaInfo> {
        let mut info = sys::MediaInfo::default();
        let ret = unsafe {
            libc::ioctl(
                fd.as_raw_fd(),
                sys::MEDIA_IOC_DEVICE_INFO,
                &mut info as *mut sys::MediaInfo,
            )
        };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(info)
    }

    fn query_topology(
        &self,
        fd: BorrowedFd<'_>,
        buf: &mut [sys::MediaInterface],
    ) -> io::Result<usize> {
        let mut topo = sys::MediaTopology::default();
        topo.num_interfaces = buf.len() as u32;
        topo.ptr_interfaces = if buf.is_empty() {
            0
        } else {
            buf.as_mut_ptr() as usize as u64
        };
        let ret = unsafe {
            libc::ioctl(
                fd.as_raw_fd(),
                sys::MEDIA_IOC_G_TOPOLOGY,
                &mut topo as *mut sys::MediaTopology,
            )
        };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(topo.num_interfaces as usize)
    }

    fn node_identity(&self, fd: BorrowedFd<'_>) -> io::Result<DeviceNode> {
        let mut st: libc::stat = unsafe { mem::zeroed() };
        let ret = unsafe { libc::fstat(fd.as_raw_fd(), &mut st) };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(DeviceNode {
            major: libc::major(st.st_rdev),
            minor: libc::minor(st.st_rdev),
        })
    }
}
