use serde::{Deserialize, Serialize};

/// Lifecycle of a [`super::ScatterGridEngine`].
///
/// `Uninitialized → Ready → Rendering ⟲ → TornDown`. `TornDown` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LifecycleState {
    #[default]
    Uninitialized,
    /// Surface configured, nothing drawn yet. Buffers are created by the first render.
    Ready,
    /// At least one frame rendered; re-entered on every trigger.
    Rendering,
    TornDown,
}

impl LifecycleState {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Uninitialized => "Uninitialized",
            Self::Ready => "Ready",
            Self::Rendering => "Rendering",
            Self::TornDown => "TornDown",
        }
    }

    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Ready | Self::Rendering)
    }

    /// State after a frame was rendered. Only live states render.
    #[must_use]
    pub const fn after_render(self) -> Self {
        match self {
            Self::Ready | Self::Rendering => Self::Rendering,
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LifecycleState;

    #[test]
    fn only_live_states_advance_to_rendering() {
        assert_eq!(LifecycleState::Ready.after_render(), LifecycleState::Rendering);
        assert_eq!(
            LifecycleState::Rendering.after_render(),
            LifecycleState::Rendering
        );
        assert_eq!(
            LifecycleState::TornDown.after_render(),
            LifecycleState::TornDown
        );
        assert!(!LifecycleState::Uninitialized.is_live());
    }
}
