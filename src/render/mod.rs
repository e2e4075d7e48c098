mod buffers;
mod headless;
mod overlay;
mod tiled;

pub use buffers::{BufferManager, BufferSyncStats, PanelBuffers};
pub use headless::{HeadlessBackend, HeadlessBufferInfo, RecordedDraw, RecordedFrame};
pub use overlay::{OverlayFrame, OverlayLabel, OverlayLine, TextHAlign};
pub use tiled::{FrameStyle, PanelDraw, PointFrame, SurfaceRect, build_frame, cell_surface_rect};

use serde::{Deserialize, Serialize};

use crate::error::ChartResult;

/// Which per-point attribute array a device buffer holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BufferKind {
    /// Clip-space `vec2` per point.
    Position,
    /// Visual diameter per point, in CSS pixels.
    Size,
    /// RGB `vec3` per point.
    Color,
}

impl BufferKind {
    #[must_use]
    pub const fn components(self) -> usize {
        match self {
            Self::Position => 2,
            Self::Size => 1,
            Self::Color => 3,
        }
    }
}

/// Move-only handle to one device buffer.
///
/// Not `Clone`: [`GpuBackend::release_buffer`] consumes the handle, so a
/// released buffer cannot be released again or bound to a draw.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct BufferId(u64);

impl BufferId {
    /// Wraps a backend-assigned buffer identifier.
    ///
    /// Only backends should mint handles.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

/// Contract implemented by any GPU backend.
///
/// Backends own the rendering surface and every device buffer. They receive a
/// fully materialized [`PointFrame`] so drawing code stays isolated from
/// normalization, layout and interaction logic.
pub trait GpuBackend {
    /// Configures (or reconfigures) the surface, in device pixels.
    ///
    /// Fails with [`crate::ChartError::ContextUnavailable`] when no surface
    /// can be provided.
    fn configure_surface(&mut self, width: u32, height: u32) -> ChartResult<()>;

    /// Uploads `contents` into a new immutable buffer.
    fn create_buffer(
        &mut self,
        kind: BufferKind,
        label: &str,
        contents: &[f32],
    ) -> ChartResult<BufferId>;

    fn release_buffer(&mut self, buffer: BufferId);

    fn render(&mut self, frame: &PointFrame<'_>) -> ChartResult<()>;
}

#[cfg(feature = "wgpu-backend")]
mod wgpu_backend;
#[cfg(feature = "wgpu-backend")]
pub use wgpu_backend::WgpuBackend;
