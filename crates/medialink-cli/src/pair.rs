// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 The medialink Authors

//! End-to-end discovery: probe a video device, then correlate its media
//! controller.

use crate::error::CliError;
use clap::Args as ClapArgs;
use medialink::{Capability, Error, MediaDevice, VideoDevice};
use serde::Serialize;

#[derive(ClapArgs, Debug)]
pub struct Args {
    /// Device directory to scan
    #[arg(long, default_value = medialink::DEV_ROOT)]
    root: String,

    /// Accept memory-to-memory (codec) devices [default if no role given]
    #[arg(long)]
    m2m: bool,

    /// Accept capture devices
    #[arg(long)]
    capture: bool,

    /// Accept output devices
    #[arg(long)]
    output: bool,
}

#[derive(Debug, Serialize)]
struct PairOutput {
    video: EndpointSummary,
    media: Option<MediaSummary>,
}

#[derive(Debug, Serialize)]
struct EndpointSummary {
    path: String,
    driver: String,
    card: String,
    node: Option<String>,
}

#[derive(Debug, Serialize)]
struct MediaSummary {
    path: String,
    driver: String,
    model: String,
    bus_info: String,
    interfaces: usize,
}

pub fn execute(args: Args, json: bool) -> Result<(), CliError> {
    log::debug!("Executing pair command: {:?}", args);

    // Default to the codec role when no role flag is given; that is what
    // the correlation exists for in the first place.
    let want_m2m = args.m2m || (!args.capture && !args.output);

    let video = VideoDevice::probe_at(&args.root, |dev| {
        let cap = dev.capability();
        let m2m = cap.has(Capability::VIDEO_M2M) || cap.has(Capability::VIDEO_M2M_MPLANE);
        let capture =
            cap.has(Capability::VIDEO_CAPTURE) || cap.has(Capability::VIDEO_CAPTURE_MPLANE);
        let output = cap.has(Capability::VIDEO_OUTPUT) || cap.has(Capability::VIDEO_OUTPUT_MPLANE);
        (want_m2m && m2m) || (args.capture && capture) || (args.output && output)
    })?;

    let media = match MediaDevice::correlate_at(&args.root, &video) {
        Ok(media) => Some(media),
        // A legacy driver without a media controller is a reportable outcome
        // of a successful pairing attempt, not a failure.
        Err(Error::NoMatchingDevice) => None,
        Err(other) => return Err(other.into()),
    };

    let output = PairOutput {
        video: EndpointSummary {
            path: video.path().display().to_string(),
            driver: video.capability().driver().to_string(),
            card: video.capability().card().to_string(),
            node: video.node_identity().ok().map(|n| n.to_string()),
        },
        media: media.map(|m| {
            let interfaces = m.interfaces().map(|i| i.len()).unwrap_or(0);
            MediaSummary {
                path: m.path().display().to_string(),
                driver: m.info().driver().to_string(),
                model: m.info().model().to_string(),
                bus_info: m.info().bus_info().to_string(),
                interfaces,
            }
        }),
    };

    if json {
        let json_str = serde_json::to_string_pretty(&output)
            .map_err(|e| CliError::General(format!("JSON serialization failed: {}", e)))?;
        println!("{}", json_str);
    } else {
        print_text_output(&output);
    }

    Ok(())
}

fn print_text_output(output: &PairOutput) {
    match &output.video.node {
        Some(node) => println!(
            "Video: {} - {} [{}]",
            output.video.path, output.video.card, node
        ),
        None => println!("Video: {} - {}", output.video.path, output.video.card),
    }
    println!("  Driver: {}", output.video.driver);

    match &output.media {
        Some(media) => {
            println!(
                "Media: {} - {} ({} interfaces)",
                media.path, media.model, media.interfaces
            );
            println!("  Driver: {}", media.driver);
            println!("  Bus: {}", media.bus_info);
        }
        None => println!("Media: none (no media controller references this video node)"),
    }
}
