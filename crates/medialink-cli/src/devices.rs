// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 The medialink Authors

//! Video device listing via the probe scan.

use crate::error::CliError;
use clap::Args as ClapArgs;
use medialink::{Capability, Error, VideoDevice};
use serde::Serialize;

#[derive(ClapArgs, Debug)]
pub struct Args {
    /// Device directory to scan
    #[arg(long, default_value = medialink::DEV_ROOT)]
    root: String,

    /// Show only memory-to-memory (codec) devices
    #[arg(long)]
    m2m: bool,

    /// Show only capture devices
    #[arg(long)]
    capture: bool,

    /// Show raw capability words as well
    #[arg(short = 'l', long)]
    long: bool,
}

#[derive(Debug, Serialize)]
struct DevicesOutput {
    devices: Vec<DeviceSummary>,
    total: usize,
}

#[derive(Debug, Serialize)]
struct DeviceSummary {
    path: String,
    driver: String,
    card: String,
    bus_info: String,
    node: Option<String>,
    flags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    capabilities: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    device_caps: Option<String>,
}

pub fn execute(args: Args, json: bool) -> Result<(), CliError> {
    log::debug!("Executing devices command: {:?}", args);

    let mut devices = Vec::new();

    // The probe stops at the first accepted candidate; a predicate that
    // records every candidate and accepts none turns it into a full
    // enumeration. Exhaustion is the expected outcome here.
    let result = VideoDevice::probe_at(&args.root, |dev| {
        if matches_filter(dev.capability(), &args) {
            devices.push(summarize(dev, args.long));
        }
        false
    });

    match result {
        Err(Error::NoMatchingDevice) => {}
        Err(other) => return Err(other.into()),
        Ok(_) => unreachable!("probe cannot accept with an always-false predicate"),
    }

    let output = DevicesOutput {
        total: devices.len(),
        devices,
    };

    if json {
        let json_str = serde_json::to_string_pretty(&output)
            .map_err(|e| CliError::General(format!("JSON serialization failed: {}", e)))?;
        println!("{}", json_str);
    } else {
        print_text_output(&output, args.long);
    }

    Ok(())
}

fn matches_filter(cap: &Capability, args: &Args) -> bool {
    // No filter flags: show everything.
    if !args.m2m && !args.capture {
        return true;
    }
    let m2m = cap.has(Capability::VIDEO_M2M) || cap.has(Capability::VIDEO_M2M_MPLANE);
    let capture = cap.has(Capability::VIDEO_CAPTURE) || cap.has(Capability::VIDEO_CAPTURE_MPLANE);
    (args.m2m && m2m) || (args.capture && capture)
}

fn summarize(dev: &VideoDevice, long: bool) -> DeviceSummary {
    let cap = dev.capability();
    DeviceSummary {
        path: dev.path().display().to_string(),
        driver: cap.driver().to_string(),
        card: cap.card().to_string(),
        bus_info: cap.bus_info().to_string(),
        node: dev.node_identity().ok().map(|n| n.to_string()),
        flags: flag_names(cap),
        capabilities: long.then(|| format!("{:#010x}", cap.capabilities())),
        device_caps: long.then(|| format!("{:#010x}", cap.device_caps())),
    }
}

fn flag_names(cap: &Capability) -> Vec<String> {
    const FLAGS: [(u32, &str); 7] = [
        (Capability::VIDEO_CAPTURE, "CAPTURE"),
        (Capability::VIDEO_CAPTURE_MPLANE, "CAPTURE_MPLANE"),
        (Capability::VIDEO_OUTPUT, "OUTPUT"),
        (Capability::VIDEO_OUTPUT_MPLANE, "OUTPUT_MPLANE"),
        (Capability::VIDEO_M2M, "M2M"),
        (Capability::VIDEO_M2M_MPLANE, "M2M_MPLANE"),
        (Capability::STREAMING, "STREAMING"),
    ];

    FLAGS
        .iter()
        .filter(|(mask, _)| cap.has(*mask))
        .map(|(_, name)| name.to_string())
        .collect()
}

fn print_text_output(output: &DevicesOutput, long: bool) {
    println!("Video Devices ({} found)\n", output.total);

    for dev in &output.devices {
        match &dev.node {
            Some(node) => println!("  {}: {} [{}]", dev.path, dev.card, node),
            None => println!("  {}: {}", dev.path, dev.card),
        }
        println!("    Driver: {}", dev.driver);
        println!("    Bus: {}", dev.bus_info);
        if !dev.flags.is_empty() {
            println!("    Caps: {}", dev.flags.join(", "));
        }
        if long {
            if let (Some(caps), Some(device_caps)) = (&dev.capabilities, &dev.device_caps) {
                println!("    Raw: capabilities={} device_caps={}", caps, device_caps);
            }
        }
        println!();
    }
}
