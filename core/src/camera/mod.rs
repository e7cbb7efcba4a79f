use async_trait::async_trait;
use image::DynamicImage;
use tracing::instrument;

use crate::errors::CameraError;
use crate::imaging::{DEFAULT_JPEG_QUALITY, encode_jpeg_base64};

mod native;

pub use native::NativeCamera;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FacingMode {
    User,
    Environment,
}

/// What is asked of the device when it is opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureConstraints {
    pub facing: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub audio: bool,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            facing: FacingMode::Environment,
            ideal_width: 1280,
            ideal_height: 720,
            audio: false,
        }
    }
}

/// A failure reported by a device backend, identified by the platform's
/// error name (e.g. `NotAllowedError`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceFailure {
    pub name: String,
    pub message: String,
}

impl DeviceFailure {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl From<DeviceFailure> for CameraError {
    fn from(failure: DeviceFailure) -> Self {
        match failure.name.as_str() {
            "NotAllowedError" | "PermissionDeniedError" => CameraError::PermissionDenied,
            "NotFoundError" | "DevicesNotFoundError" => CameraError::NotFound,
            "NotReadableError" | "TrackStartError" => CameraError::InUse,
            "OverconstrainedError" => CameraError::Overconstrained,
            _ => CameraError::Unknown(format!("{}: {}", failure.name, failure.message)),
        }
    }
}

/// Video source able to hand out single still frames.
#[async_trait]
pub trait CameraDevice: Send {
    async fn open(&mut self, constraints: &CaptureConstraints) -> Result<(), DeviceFailure>;

    async fn grab_frame(&mut self) -> Result<DynamicImage, DeviceFailure>;

    /// Stops all tracks. Called whether or not the capture succeeded.
    fn release(&mut self);
}

/// Opens the device, captures one frame, releases the device and returns
/// the frame as header-less base64 JPEG.
#[instrument(name = "camera-capture", skip_all)]
pub async fn capture_still<D: CameraDevice + ?Sized>(
    device: &mut D,
    constraints: &CaptureConstraints,
) -> Result<String, CameraError> {
    let frame = match device.open(constraints).await {
        Ok(()) => device.grab_frame().await,
        Err(e) => Err(e),
    };
    device.release();

    let frame = frame.map_err(|e| {
        tracing::warn!(name = e.name.as_str(), "Camera failure: {}", e.message);
        CameraError::from(e)
    })?;
    tracing::debug!(width = frame.width(), height = frame.height(), "Captured frame");

    encode_jpeg_base64(&frame, DEFAULT_JPEG_QUALITY).map_err(CameraError::Encoding)
}


#[cfg(test)]
mod test {
    use super::fake::FakeCamera;
    use super::*;
    use crate::imaging::decode_base64;

    #[test]
    fn test_failure_names_map_to_categories() {
        let map = |name: &str| CameraError::from(DeviceFailure::new(name, ""));
        assert!(matches!(map("NotAllowedError"), CameraError::PermissionDenied));
        assert!(matches!(map("PermissionDeniedError"), CameraError::PermissionDenied));
        assert!(matches!(map("NotFoundError"), CameraError::NotFound));
        assert!(matches!(map("DevicesNotFoundError"), CameraError::NotFound));
        assert!(matches!(map("NotReadableError"), CameraError::InUse));
        assert!(matches!(map("TrackStartError"), CameraError::InUse));
        assert!(matches!(map("OverconstrainedError"), CameraError::Overconstrained));
        assert!(matches!(map("AbortError"), CameraError::Unknown(_)));
    }

    #[tokio::test]
    async fn test_capture_requests_environment_camera() {
        let mut camera = FakeCamera::working();
        let encoded = capture_still(&mut camera, &CaptureConstraints::default())
            .await
            .unwrap();

        let constraints = camera.opened_with.unwrap();
        assert_eq!(constraints.facing, FacingMode::Environment);
        assert_eq!((constraints.ideal_width, constraints.ideal_height), (1280, 720));
        assert!(!constraints.audio);
        assert!(camera.released);

        let bytes = decode_base64(&encoded).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), image::ImageFormat::Jpeg);
    }

    #[tokio::test]
    async fn test_failed_open_still_releases() {
        let mut camera = FakeCamera::failing("NotReadableError");
        let err = capture_still(&mut camera, &CaptureConstraints::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CameraError::InUse));
        assert!(camera.released);
    }
}
