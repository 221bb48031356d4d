// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 The medialink Authors

//! Media-controller topology types and the two-phase interface fetch.
//!
//! The interface count of a media device is unknown in advance, so the
//! topology query runs twice: once with no buffer to learn the count, once
//! with an exactly-sized buffer to fill it. The count can drift between the
//! phases if the device is reconfigured concurrently; the fetch bounds the
//! result to what was both allocated and filled instead of re-validating
//! with a third query.

use std::fmt;
use std::io;
use std::os::fd::BorrowedFd;

use crate::io::DeviceIo;
use crate::sys;
use crate::Error;

/// Kernel device-node identity: the (major, minor) pair of the device a
/// character special file refers to.
///
/// This is the sole correlation key between a video device and its owning
/// media controller; paths and device names carry no correlation meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceNode {
    pub major: u32,
    pub minor: u32,
}

impl fmt::Display for DeviceNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.major, self.minor)
    }
}

/// Kind of a topology interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceKind {
    /// A plain V4L2 video node (`MEDIA_INTF_T_V4L_VIDEO`).
    Video,
    /// Any other interface type, with the raw kernel value.
    Other(u32),
}

impl InterfaceKind {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            sys::MEDIA_INTF_T_V4L_VIDEO => InterfaceKind::Video,
            other => InterfaceKind::Other(other),
        }
    }
}

/// One interface record from a media-controller topology.
///
/// Transient: lives only for the correlation attempt that fetched it.
#[derive(Debug, Clone, Copy)]
pub struct Interface {
    pub kind: InterfaceKind,
    pub devnode: DeviceNode,
}

impl Interface {
    fn from_raw(raw: &sys::MediaInterface) -> Self {
        // Copies out of the packed record; references into it are not taken.
        let intf_type = raw.intf_type;
        let major = raw.devnode.major;
        let minor = raw.devnode.minor;
        Interface {
            kind: InterfaceKind::from_raw(intf_type),
            devnode: DeviceNode { major, minor },
        }
    }
}

/// Fetch the interface table of an open media descriptor.
pub(crate) fn fetch_interfaces<I: DeviceIo>(
    io: &I,
    fd: BorrowedFd<'_>,
) -> Result<Vec<Interface>, Error> {
    let raw = fetch_sized(|buf| io.query_topology(fd, buf))?;
    Ok(raw.iter().map(Interface::from_raw).collect())
}

/// Two-phase sized fetch: ask the kernel how many records it has, allocate
/// exactly that many, ask again with the buffer attached.
///
/// `query` is the kernel call: given an empty buffer it reports the record
/// count without filling anything; given a buffer it fills it and reports
/// the count it saw. The same shape serves any variable-length kernel
/// response, parameterized over the record type and the call itself.
///
/// The result never extends past the phase-1 allocation, even if the kernel
/// reports a larger count in phase 2 (the buffer holds only the allocated
/// records), and never past the phase-2 count (records beyond it were not
/// written).
fn fetch_sized<T, F>(mut query: F) -> Result<Vec<T>, Error>
where
    T: Default + Clone,
    F: FnMut(&mut [T]) -> io::Result<usize>,
{
    let reported = query(&mut []).map_err(Error::TopologyQuery)?;
    if reported == 0 {
        return Ok(Vec::new());
    }

    let mut buf: Vec<T> = Vec::new();
    buf.try_reserve_exact(reported)
        .map_err(Error::AllocationFailed)?;
    buf.resize(reported, T::default());

    let live = query(&mut buf).map_err(Error::TopologyQuery)?;
    buf.truncate(live);
    Ok(buf)
}
