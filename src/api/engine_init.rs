use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::core::{GridLayout, PreparedPanelCache};
use crate::error::{ChartError, ChartResult};
use crate::interaction::InteractionState;
use crate::render::{BufferManager, GpuBackend};

use super::engine::{FrameStats, backing_surface};
use super::{InvalidationMask, LifecycleState, ScatterGridConfig, ScatterGridEngine};

impl<B: GpuBackend> ScatterGridEngine<B> {
    /// Creates an engine with an empty panel set and a configured surface.
    ///
    /// Any failure to obtain a surface is reported as
    /// [`ChartError::ContextUnavailable`]; no buffers exist at that point, so
    /// nothing needs releasing and nothing is ever drawn.
    pub fn new(mut backend: B, config: ScatterGridConfig, canvas_width: f64) -> ChartResult<Self> {
        config.validate()?;
        let layout = GridLayout::compute(0, config.layout_config(), canvas_width)?;
        let surface = backing_surface(&layout, config.device_pixel_ratio);

        backend
            .configure_surface(surface.0, surface.1)
            .map_err(|err| match err {
                ChartError::ContextUnavailable(_) => err,
                other => ChartError::ContextUnavailable(other.to_string()),
            })
            .inspect_err(|err| warn!(error = %err, "surface configuration failed"))?;

        debug!(
            canvas_width,
            width = surface.0,
            height = surface.1,
            "engine initialized"
        );
        Ok(Self {
            backend,
            config,
            state: LifecycleState::Ready,
            panels: Vec::new(),
            markers: IndexMap::new(),
            cache: PreparedPanelCache::new(),
            prepared: Vec::new(),
            layout,
            surface,
            buffers: BufferManager::new(),
            pending: InvalidationMask::full(),
            interaction: InteractionState::default(),
            stats: FrameStats::default(),
        })
    }
}
