pub mod command;
pub mod directory;
pub mod frame;

pub use command::CommandFrameSource;
pub use directory::DirectoryFrameSource;
pub use frame::Frame;

use std::future::Future;

/// Produces one still image on demand.
///
/// Implementations never fail past this boundary: any capture problem is
/// logged and reported as `None` so the caller skips the cycle. No retries.
pub trait FrameSource: Send + Sync {
    fn capture_frame(&self) -> impl Future<Output = Option<Frame>> + Send;
}

/// The camera backends selectable at startup.
pub enum CameraDevice {
    Directory(DirectoryFrameSource),
    Command(CommandFrameSource),
}

impl FrameSource for CameraDevice {
    async fn capture_frame(&self) -> Option<Frame> {
        match self {
            CameraDevice::Directory(source) => source.capture_frame().await,
            CameraDevice::Command(source) => source.capture_frame().await,
        }
    }
}

/// An authorized camera, or the lack of one.
///
/// Without a device every capture yields `None`, mirroring a camera whose
/// permission was never granted.
pub struct CameraHandle<S> {
    device: Option<S>,
}

impl<S> CameraHandle<S> {
    pub fn new(device: S) -> Self {
        Self {
            device: Some(device),
        }
    }

    pub fn unavailable() -> Self {
        Self { device: None }
    }

    pub fn is_available(&self) -> bool {
        self.device.is_some()
    }
}

impl<S: FrameSource> FrameSource for CameraHandle<S> {
    async fn capture_frame(&self) -> Option<Frame> {
        match &self.device {
            Some(device) => device.capture_frame().await,
            None => None,
        }
    }
}
