use indexmap::IndexMap;
use tracing::{trace, warn};

use crate::error::{ChartError, ChartResult};
use crate::render::{BufferId, BufferKind, GpuBackend, PointFrame, SurfaceRect};

/// Metadata and contents of one live headless buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessBufferInfo {
    pub kind: BufferKind,
    pub label: String,
    pub contents: Vec<f32>,
}

/// One executed draw, with the buffer contents it read.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    pub panel_index: usize,
    pub point_count: u32,
    pub viewport: SurfaceRect,
    pub scissor: SurfaceRect,
    pub positions: Vec<f32>,
    pub sizes: Vec<f32>,
    pub colors: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedFrame {
    pub surface_width: u32,
    pub surface_height: u32,
    pub draws: Vec<RecordedDraw>,
}

/// CPU-only backend used by tests and headless hosts.
///
/// It keeps buffer contents in memory and validates every frame, so buffer
/// lifecycle mistakes surface as errors instead of silent GPU misuse.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_id: u64,
    buffers: IndexMap<u64, HeadlessBufferInfo>,
    surface: Option<(u32, u32)>,
    context_unavailable: bool,
    buffer_budget: Option<usize>,
    created: usize,
    released: usize,
    frames_rendered: u64,
    last_frame: Option<RecordedFrame>,
}

impl HeadlessBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend whose surface can never be configured.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            context_unavailable: true,
            ..Self::default()
        }
    }

    /// Limits the total number of buffers that may ever be created.
    #[must_use]
    pub fn with_buffer_budget(mut self, budget: usize) -> Self {
        self.buffer_budget = Some(budget);
        self
    }

    #[must_use]
    pub fn surface_size(&self) -> Option<(u32, u32)> {
        self.surface
    }

    #[must_use]
    pub fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }

    #[must_use]
    pub fn created_buffer_count(&self) -> usize {
        self.created
    }

    #[must_use]
    pub fn released_buffer_count(&self) -> usize {
        self.released
    }

    #[must_use]
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    #[must_use]
    pub fn last_frame(&self) -> Option<&RecordedFrame> {
        self.last_frame.as_ref()
    }

    #[must_use]
    pub fn buffer(&self, id: &BufferId) -> Option<&HeadlessBufferInfo> {
        self.buffers.get(&id.raw())
    }

    fn read(&self, id: &BufferId, kind: BufferKind) -> ChartResult<&[f32]> {
        let info = self.buffers.get(&id.raw()).ok_or(ChartError::Lifecycle {
            operation: "draw with released buffer",
            state: "released",
        })?;
        if info.kind != kind {
            return Err(ChartError::Backend(format!(
                "buffer `{}` bound as {kind:?} but holds {:?}",
                info.label, info.kind
            )));
        }
        Ok(&info.contents)
    }
}

impl GpuBackend for HeadlessBackend {
    fn configure_surface(&mut self, width: u32, height: u32) -> ChartResult<()> {
        if self.context_unavailable {
            let reason = "headless surface disabled".to_owned();
            return Err(ChartError::ContextUnavailable(reason));
        }
        self.surface = Some((width.max(1), height.max(1)));
        Ok(())
    }

    fn create_buffer(
        &mut self,
        kind: BufferKind,
        label: &str,
        contents: &[f32],
    ) -> ChartResult<BufferId> {
        if self.buffer_budget.is_some_and(|budget| self.created >= budget) {
            return Err(ChartError::Backend(format!(
                "buffer budget exhausted while creating `{label}`"
            )));
        }
        if contents.len() % kind.components() != 0 {
            return Err(ChartError::InvalidData(format!(
                "buffer `{label}` length {} is not a multiple of {}",
                contents.len(),
                kind.components()
            )));
        }

        self.next_id += 1;
        self.created += 1;
        self.buffers.insert(
            self.next_id,
            HeadlessBufferInfo {
                kind,
                label: label.to_owned(),
                contents: contents.to_vec(),
            },
        );
        trace!(id = self.next_id, label, "headless buffer created");
        Ok(BufferId::from_raw(self.next_id))
    }

    fn release_buffer(&mut self, buffer: BufferId) {
        if self.buffers.shift_remove(&buffer.raw()).is_some() {
            self.released += 1;
        } else {
            warn!(id = buffer.raw(), "release of unknown headless buffer");
        }
    }

    fn render(&mut self, frame: &PointFrame<'_>) -> ChartResult<()> {
        frame.validate()?;
        let Some((width, height)) = self.surface else {
            return Err(ChartError::Lifecycle {
                operation: "render",
                state: "surface not configured",
            });
        };
        if (width, height) != (frame.surface_width, frame.surface_height) {
            return Err(ChartError::InvalidViewport {
                width: frame.surface_width,
                height: frame.surface_height,
            });
        }

        let mut draws = Vec::with_capacity(frame.draws.len());
        for draw in &frame.draws {
            let count = draw.buffers.point_count() as usize;
            let positions = self.read(draw.buffers.position(), BufferKind::Position)?;
            let sizes = self.read(draw.buffers.size(), BufferKind::Size)?;
            let colors = self.read(draw.buffers.color(), BufferKind::Color)?;
            if positions.len() != count * 2 || sizes.len() != count || colors.len() != count * 3 {
                return Err(ChartError::Backend(format!(
                    "panel {} buffers are not aligned with {count} points",
                    draw.panel_index
                )));
            }
            draws.push(RecordedDraw {
                panel_index: draw.panel_index,
                point_count: draw.buffers.point_count(),
                viewport: draw.viewport,
                scissor: draw.scissor,
                positions: positions.to_vec(),
                sizes: sizes.to_vec(),
                colors: colors.to_vec(),
            });
        }

        self.frames_rendered += 1;
        self.last_frame = Some(RecordedFrame {
            surface_width: width,
            surface_height: height,
            draws,
        });
        Ok(())
    }
}
