use serde::{Deserialize, Serialize};

/// Reason a repaint was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvalidationTopic {
    /// Panel set or normalization inputs changed; buffers must be rebuilt.
    Data,
    /// Column count, cell height, gap or margin changed.
    Layout,
    /// The canvas's on-screen width changed.
    Resize,
    /// Clear color, alpha or pixel ratio changed.
    Style,
    /// Marker overlays changed.
    Overlay,
}

impl InvalidationTopic {
    const fn bit(self) -> u8 {
        match self {
            Self::Data => 1 << 0,
            Self::Layout => 1 << 1,
            Self::Resize => 1 << 2,
            Self::Style => 1 << 3,
            Self::Overlay => 1 << 4,
        }
    }
}

/// Coalesced repaint request consumed by the host's frame callback.
///
/// Any number of triggers between two frames merge into one mask and
/// therefore into one render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InvalidationMask {
    bits: u8,
}

impl InvalidationMask {
    const ALL_BITS: u8 = InvalidationTopic::Data.bit()
        | InvalidationTopic::Layout.bit()
        | InvalidationTopic::Resize.bit()
        | InvalidationTopic::Style.bit()
        | InvalidationTopic::Overlay.bit();

    #[must_use]
    pub const fn none() -> Self {
        Self { bits: 0 }
    }

    #[must_use]
    pub const fn full() -> Self {
        Self {
            bits: Self::ALL_BITS,
        }
    }

    #[must_use]
    pub const fn from_topic(topic: InvalidationTopic) -> Self {
        Self { bits: topic.bit() }
    }

    #[must_use]
    pub const fn with_topic(self, topic: InvalidationTopic) -> Self {
        Self {
            bits: self.bits | topic.bit(),
        }
    }

    pub fn insert(&mut self, topic: InvalidationTopic) {
        self.bits |= topic.bit();
    }

    #[must_use]
    pub const fn contains(self, topic: InvalidationTopic) -> bool {
        self.bits & topic.bit() != 0
    }

    #[must_use]
    pub const fn is_none(self) -> bool {
        self.bits == 0
    }
}

#[cfg(test)]
mod tests {
    use super::{InvalidationMask, InvalidationTopic};

    #[test]
    fn topics_coalesce() {
        let mut mask = InvalidationMask::none();
        mask.insert(InvalidationTopic::Resize);
        mask.insert(InvalidationTopic::Resize);
        mask.insert(InvalidationTopic::Data);
        assert!(mask.contains(InvalidationTopic::Resize));
        assert!(mask.contains(InvalidationTopic::Data));
        assert!(!mask.contains(InvalidationTopic::Layout));
    }

    #[test]
    fn full_mask_contains_every_topic() {
        let full = InvalidationMask::full();
        for topic in [
            InvalidationTopic::Data,
            InvalidationTopic::Layout,
            InvalidationTopic::Resize,
            InvalidationTopic::Style,
            InvalidationTopic::Overlay,
        ] {
            assert!(full.contains(topic));
            assert!(!InvalidationMask::none().contains(topic));
        }
        assert_eq!(
            InvalidationMask::none().with_topic(InvalidationTopic::Style),
            InvalidationMask::from_topic(InvalidationTopic::Style)
        );
    }
}
