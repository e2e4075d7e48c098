use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::core::PreparedPanel;
use crate::error::{ChartError, ChartResult};
use crate::render::{BufferId, BufferKind, GpuBackend};

/// Position/size/color buffers of one prepared panel snapshot.
#[derive(Debug)]
pub struct PanelBuffers {
    position: BufferId,
    size: BufferId,
    color: BufferId,
    point_count: u32,
}

impl PanelBuffers {
    fn create<B: GpuBackend + ?Sized>(
        backend: &mut B,
        index: usize,
        panel: &PreparedPanel,
    ) -> ChartResult<Self> {
        let point_count = u32::try_from(panel.point_count()).map_err(|_| {
            ChartError::InvalidData(format!(
                "panel `{}` has too many points for one draw",
                panel.id()
            ))
        })?;

        let position = backend.create_buffer(
            BufferKind::Position,
            &format!("panel {index} positions"),
            panel.positions(),
        )?;
        let size = match backend.create_buffer(
            BufferKind::Size,
            &format!("panel {index} sizes"),
            panel.sizes(),
        ) {
            Ok(size) => size,
            Err(err) => {
                backend.release_buffer(position);
                return Err(err);
            }
        };
        let color = match backend.create_buffer(
            BufferKind::Color,
            &format!("panel {index} colors"),
            panel.colors(),
        ) {
            Ok(color) => color,
            Err(err) => {
                backend.release_buffer(position);
                backend.release_buffer(size);
                return Err(err);
            }
        };

        Ok(Self {
            position,
            size,
            color,
            point_count,
        })
    }

    fn release<B: GpuBackend + ?Sized>(self, backend: &mut B) {
        backend.release_buffer(self.position);
        backend.release_buffer(self.size);
        backend.release_buffer(self.color);
    }

    #[must_use]
    pub fn position(&self) -> &BufferId {
        &self.position
    }

    #[must_use]
    pub fn size(&self) -> &BufferId {
        &self.size
    }

    #[must_use]
    pub fn color(&self) -> &BufferId {
        &self.color
    }

    #[must_use]
    pub fn point_count(&self) -> u32 {
        self.point_count
    }
}

struct Slot {
    snapshot: Arc<PreparedPanel>,
    buffers: Option<PanelBuffers>,
}

/// Outcome of one [`BufferManager::sync`] pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferSyncStats {
    pub created_sets: usize,
    pub released_sets: usize,
    pub reused_sets: usize,
}

/// Owns one [`PanelBuffers`] set per non-empty prepared panel.
///
/// Sets are tied to a snapshot by `Arc` identity. A changed snapshot has its
/// old set taken out of the manager and released before the new set is
/// created, so at most one set per panel index is ever live.
#[derive(Default)]
pub struct BufferManager {
    slots: Vec<Option<Slot>>,
}

impl BufferManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Brings live buffers in line with `panels`.
    ///
    /// On a creation error the failing panel is left without buffers and the
    /// error is returned; sets already owned by the manager stay owned and
    /// are released by [`Self::release_all`].
    pub fn sync<B: GpuBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        panels: &[Arc<PreparedPanel>],
    ) -> ChartResult<BufferSyncStats> {
        let mut stats = BufferSyncStats::default();

        while self.slots.len() > panels.len() {
            if let Some(buffers) = self.slots.pop().flatten().and_then(|slot| slot.buffers) {
                buffers.release(backend);
                stats.released_sets += 1;
            }
        }
        self.slots.resize_with(panels.len(), || None);

        for (index, panel) in panels.iter().enumerate() {
            let slot = &mut self.slots[index];
            if matches!(slot, Some(current) if Arc::ptr_eq(&current.snapshot, panel)) {
                stats.reused_sets += 1;
                continue;
            }

            if let Some(buffers) = slot.take().and_then(|previous| previous.buffers) {
                buffers.release(backend);
                stats.released_sets += 1;
            }

            let buffers = if panel.is_empty() {
                None
            } else {
                let buffers = PanelBuffers::create(backend, index, panel)?;
                stats.created_sets += 1;
                Some(buffers)
            };
            trace!(index, points = panel.point_count(), "panel buffers synced");
            *slot = Some(Slot {
                snapshot: Arc::clone(panel),
                buffers,
            });
        }

        debug!(
            created = stats.created_sets,
            released = stats.released_sets,
            reused = stats.reused_sets,
            "buffer sync"
        );
        Ok(stats)
    }

    /// Live buffers for `index`, only if they belong to `snapshot`.
    #[must_use]
    pub fn buffers_for(
        &self,
        index: usize,
        snapshot: &Arc<PreparedPanel>,
    ) -> Option<&PanelBuffers> {
        self.slots
            .get(index)?
            .as_ref()
            .filter(|slot| Arc::ptr_eq(&slot.snapshot, snapshot))?
            .buffers
            .as_ref()
    }

    /// Releases every live set exactly once and returns how many were released.
    pub fn release_all<B: GpuBackend + ?Sized>(&mut self, backend: &mut B) -> usize {
        let mut released = 0;
        for buffers in self
            .slots
            .drain(..)
            .flatten()
            .filter_map(|slot| slot.buffers)
        {
            buffers.release(backend);
            released += 1;
        }
        if released > 0 {
            debug!(released, "released all panel buffers");
        }
        released
    }

    #[must_use]
    pub fn live_set_count(&self) -> usize {
        self.slots
            .iter()
            .flatten()
            .filter(|slot| slot.buffers.is_some())
            .count()
    }
}

impl Drop for BufferManager {
    fn drop(&mut self) {
        let live = self.live_set_count();
        if live > 0 {
            warn!(live, "buffer manager dropped with live panel buffers");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::BufferManager;
    use crate::core::{NormalizerConfig, Panel, Point, PreparedPanel, prepare_panel};
    use crate::render::HeadlessBackend;

    fn prepared(id: &str, count: usize) -> Arc<PreparedPanel> {
        let points = (0..count)
            .map(|i| Point::new(i as f64, 0.5 + i as f64 * 0.01))
            .collect();
        Arc::new(prepare_panel(
            Arc::new(Panel::new(id, id).with_points(points)),
            &NormalizerConfig::default(),
        ))
    }

    #[test]
    fn empty_panels_own_no_buffers() {
        let mut backend = HeadlessBackend::new();
        let mut manager = BufferManager::new();
        let panels = vec![prepared("a", 3), prepared("b", 0)];

        let stats = manager.sync(&mut backend, &panels).expect("sync");
        assert_eq!(stats.created_sets, 1);
        assert_eq!(manager.live_set_count(), 1);
        assert_eq!(backend.live_buffer_count(), 3);
        assert!(manager.buffers_for(1, &panels[1]).is_none());

        manager.release_all(&mut backend);
    }

    #[test]
    fn changed_snapshot_releases_before_recreating() {
        let mut backend = HeadlessBackend::new();
        let mut manager = BufferManager::new();
        let first = vec![prepared("a", 2), prepared("b", 2)];
        manager.sync(&mut backend, &first).expect("sync");

        let second = vec![Arc::clone(&first[0]), prepared("b", 5)];
        let stats = manager.sync(&mut backend, &second).expect("resync");
        assert_eq!(stats.reused_sets, 1);
        assert_eq!(stats.released_sets, 1);
        assert_eq!(stats.created_sets, 1);
        assert_eq!(backend.live_buffer_count(), 6);
        assert!(manager.buffers_for(1, &first[1]).is_none());
        let replaced = manager.buffers_for(1, &second[1]).expect("replaced set");
        assert_eq!(replaced.point_count(), 5);

        assert_eq!(manager.release_all(&mut backend), 2);
        assert_eq!(backend.live_buffer_count(), 0);
        assert_eq!(backend.created_buffer_count(), backend.released_buffer_count());
    }

    #[test]
    fn shrinking_panel_set_releases_trailing_sets() {
        let mut backend = HeadlessBackend::new();
        let mut manager = BufferManager::new();
        let panels = vec![prepared("a", 1), prepared("b", 1), prepared("c", 1)];
        manager.sync(&mut backend, &panels).expect("sync");

        let stats = manager.sync(&mut backend, &panels[..1]).expect("shrink");
        assert_eq!(stats.released_sets, 2);
        assert_eq!(backend.live_buffer_count(), 3);
        manager.release_all(&mut backend);
    }

    #[test]
    fn failed_creation_releases_partial_set() {
        let mut backend = HeadlessBackend::new().with_buffer_budget(4);
        let mut manager = BufferManager::new();
        let panels = vec![prepared("a", 1), prepared("b", 1)];

        assert!(manager.sync(&mut backend, &panels).is_err());
        assert_eq!(manager.live_set_count(), 1);
        assert_eq!(backend.live_buffer_count(), 3);

        manager.release_all(&mut backend);
        assert_eq!(backend.live_buffer_count(), 0);
    }
}
