//! Screenshot capture and the periodic capture tick.
//!
//! The raw capture primitive sits behind [`ScreenCapture`]; the production
//! implementation grabs the primary display with `xcap` and encodes PNG
//! bytes. The tick handler applies the privacy and reachability gates and the
//! never-lose-activity-credit counter policy.

use crate::api::{ApiError, ScreenshotRequest};
use crate::libs::activity::activity_score;
use crate::libs::agent::Agent;
use crate::libs::monitor;
use crate::libs::scheduler::Scheduler;
use base64::prelude::*;
use image::imageops::FilterType;
use image::ImageFormat;
use std::io::Cursor;
use thiserror::Error;

/// Downscale factor for the blur pass; 1/8 resolution keeps window layout
/// recognizable while making text unreadable.
const BLUR_FACTOR: u32 = 8;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no display available")]
    NoDisplay,
    #[error("capture failed: {0}")]
    Failed(String),
}

pub trait ScreenCapture: Send {
    /// Captures the primary display and returns encoded PNG bytes.
    fn capture(&self) -> Result<Vec<u8>, CaptureError>;
}

/// Capture backed by `xcap`, always targeting the first monitor.
pub struct PrimaryDisplay;

impl ScreenCapture for PrimaryDisplay {
    fn capture(&self) -> Result<Vec<u8>, CaptureError> {
        let monitors = xcap::Monitor::all().map_err(|e| CaptureError::Failed(e.to_string()))?;
        let monitor = monitors.first().ok_or(CaptureError::NoDisplay)?;
        let frame = monitor.capture_image().map_err(|e| CaptureError::Failed(e.to_string()))?;

        let (width, height) = (frame.width(), frame.height());
        let image = image::RgbaImage::from_raw(width, height, frame.into_raw())
            .ok_or_else(|| CaptureError::Failed("invalid frame buffer".to_string()))?;

        let mut buf = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(|e| CaptureError::Failed(e.to_string()))?;
        Ok(buf)
    }
}

/// Obscures a PNG frame by round-tripping it through a low resolution.
///
/// Dimensions are preserved so server-side thumbnails and layout analysis
/// still work on blurred uploads.
fn blur(bytes: &[u8]) -> Result<Vec<u8>, CaptureError> {
    let image = image::load_from_memory(bytes).map_err(|e| CaptureError::Failed(e.to_string()))?;
    let (width, height) = (image.width(), image.height());

    let coarse = image
        .resize_exact((width / BLUR_FACTOR).max(1), (height / BLUR_FACTOR).max(1), FilterType::Triangle)
        .resize_exact(width, height, FilterType::Triangle);

    let mut buf = Vec::new();
    coarse
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| CaptureError::Failed(e.to_string()))?;
    Ok(buf)
}

/// One capture cycle: capture, score, upload, reset counters on success.
///
/// Skips silently under privacy mode and while the server is known to be
/// unreachable; reachability is re-established by the next heartbeat success
/// or monitoring start. Capture and upload failures leave the counters
/// untouched so the next successful capture claims the full activity window.
pub async fn on_capture_tick(agent: &mut Agent, sched: &mut Scheduler) {
    if agent.config.privacy.privacy_mode {
        tracing::debug!("capture skipped: privacy mode");
        return;
    }
    if !agent.is_server_reachable {
        tracing::debug!("capture skipped: server unreachable");
        return;
    }

    let image = match agent.capture.capture() {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("screen capture failed: {e}");
            return;
        }
    };

    // The blur flag is a privacy control: if the pass fails, drop the frame
    // rather than upload it sharp.
    let image = if agent.config.privacy.blur_screenshots {
        match blur(&image) {
            Ok(blurred) => blurred,
            Err(e) => {
                tracing::warn!("screenshot blur failed, dropping frame: {e}");
                return;
            }
        }
    } else {
        image
    };

    let counters = agent.activity.snapshot();
    let request = ScreenshotRequest {
        image_data: BASE64_STANDARD.encode(&image),
        clicks: counters.clicks,
        keystrokes: counters.keystrokes,
        activity_score: activity_score(&counters),
    };

    match agent.gateway.upload_screenshot(&request).await {
        Ok(()) => {
            agent.is_server_reachable = true;
            agent.activity.reset();
            tracing::debug!(
                clicks = counters.clicks,
                keystrokes = counters.keystrokes,
                score = request.activity_score,
                "screenshot uploaded"
            );
        }
        Err(ApiError::Connectivity(e)) => {
            agent.is_server_reachable = false;
            tracing::warn!("screenshot upload failed, marking server unreachable: {e}");
        }
        Err(ApiError::Auth) => monitor::handle_auth_expiry(agent, sched).await,
        Err(e @ ApiError::Validation { .. }) => {
            tracing::warn!("screenshot rejected by server, dropping: {e}");
        }
    }
}
