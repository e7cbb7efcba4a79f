use async_trait::async_trait;
use image::{DynamicImage, RgbImage};

use super::{CameraDevice, CaptureConstraints, DeviceFailure};

/// A camera attached to this machine, addressed by its index.
///
/// The device is only held while a frame is being grabbed. Capture runs on
/// the blocking pool since the platform handles are not `Send`.
#[derive(Debug, Default)]
pub struct NativeCamera {
    index: u32,
    constraints: Option<CaptureConstraints>,
}

impl NativeCamera {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            constraints: None,
        }
    }
}

/// Maps the text of a backend error onto a platform failure name.
#[cfg_attr(not(feature = "native-camera"), allow(dead_code))]
fn classify(message: &str) -> Option<&'static str> {
    let message = message.to_lowercase();
    if ["permission", "denied", "not authorized"]
        .iter()
        .any(|p| message.contains(p))
    {
        Some("NotAllowedError")
    } else if message.contains("busy") || message.contains("in use") {
        Some("NotReadableError")
    } else if message.contains("no such") || message.contains("not found") {
        Some("NotFoundError")
    } else {
        None
    }
}

async fn blocking<T, F>(task: F) -> Result<T, DeviceFailure>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, DeviceFailure> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| DeviceFailure::new("AbortError", e.to_string()))?
}

#[cfg(feature = "native-camera")]
mod backend {
    use image::RgbImage;
    use nokhwa::pixel_format::RgbFormat;
    use nokhwa::utils::{
        ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat,
        RequestedFormatType, Resolution,
    };
    use nokhwa::{Camera, NokhwaError};

    use super::{CaptureConstraints, DeviceFailure, classify};

    fn failure(error: NokhwaError) -> DeviceFailure {
        let message = error.to_string();
        let name = classify(&message).unwrap_or(match error {
            NokhwaError::OpenDeviceError { .. } | NokhwaError::OpenStreamError { .. } => {
                "TrackStartError"
            }
            NokhwaError::SetPropertyError { .. } | NokhwaError::GetPropertyError { .. } => {
                "OverconstrainedError"
            }
            _ => "AbortError",
        });
        DeviceFailure::new(name, message)
    }

    pub(super) fn probe(index: u32) -> Result<(), DeviceFailure> {
        let devices = nokhwa::query(ApiBackend::Auto).map_err(failure)?;
        tracing::debug!(devices = devices.len(), "Queried cameras");
        if devices.len() <= index as usize {
            return Err(DeviceFailure::new(
                "NotFoundError",
                format!("no camera at index {index}"),
            ));
        }
        Ok(())
    }

    pub(super) fn capture(
        index: u32,
        constraints: &CaptureConstraints,
    ) -> Result<RgbImage, DeviceFailure> {
        let format = CameraFormat::new(
            Resolution::new(constraints.ideal_width, constraints.ideal_height),
            FrameFormat::MJPEG,
            30,
        );
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(format));

        let mut camera = Camera::new(CameraIndex::Index(index), requested).map_err(failure)?;
        camera.open_stream().map_err(failure)?;
        let frame = camera
            .frame()
            .and_then(|buffer| buffer.decode_image::<RgbFormat>());
        if let Err(e) = camera.stop_stream() {
            tracing::warn!("Could not stop camera stream: {e}");
        }

        let frame = frame.map_err(failure)?;
        let (width, height) = frame.dimensions();
        RgbImage::from_raw(width, height, frame.into_raw()).ok_or_else(|| {
            DeviceFailure::new("AbortError", "frame buffer does not match its size")
        })
    }
}

#[cfg(not(feature = "native-camera"))]
mod backend {
    use image::RgbImage;

    use super::{CaptureConstraints, DeviceFailure};

    fn unsupported() -> DeviceFailure {
        DeviceFailure::new(
            "NotFoundError",
            "built without the `native-camera` feature",
        )
    }

    pub(super) fn probe(_index: u32) -> Result<(), DeviceFailure> {
        Err(unsupported())
    }

    pub(super) fn capture(
        _index: u32,
        _constraints: &CaptureConstraints,
    ) -> Result<RgbImage, DeviceFailure> {
        Err(unsupported())
    }
}

#[async_trait]
impl CameraDevice for NativeCamera {
    async fn open(&mut self, constraints: &CaptureConstraints) -> Result<(), DeviceFailure> {
        let index = self.index;
        blocking(move || backend::probe(index)).await?;
        // Desktop devices have no facing mode, the index picks the camera.
        tracing::debug!(index, facing = ?constraints.facing, "Camera available");
        self.constraints = Some(*constraints);
        Ok(())
    }

    async fn grab_frame(&mut self) -> Result<DynamicImage, DeviceFailure> {
        let constraints = self
            .constraints
            .ok_or_else(|| DeviceFailure::new("InvalidStateError", "camera is not open"))?;
        let index = self.index;
        let frame = blocking(move || backend::capture(index, &constraints)).await?;
        Ok(DynamicImage::ImageRgb8(frame))
    }

    fn release(&mut self) {
        self.constraints = None;
    }
}
