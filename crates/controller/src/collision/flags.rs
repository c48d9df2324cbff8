//! Physics layers and layer masks for probe filtering.
//!
//! Every collider lives on one of 32 layers. Probes carry a [`LayerMask`]
//! selecting which layers they can hit.

use serde::{Deserialize, Serialize};

use super::trace::PhysicsQuery;

/// Number of physics layers.
pub const LAYER_COUNT: u8 = 32;

/// A physics layer index (0..32).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Layer(pub u8);

impl Layer {
    /// Layer everything starts on.
    pub const DEFAULT: Self = Self(0);

    /// Built-in layer that probes always skip.
    pub const IGNORE_RAYCAST: Self = Self(2);

    /// Bit for this layer inside a [`LayerMask`]. Out of range layers map to
    /// no bit at all.
    #[inline]
    pub fn bit(self) -> u32 {
        1u32.checked_shl(u32::from(self.0)).unwrap_or(0)
    }
}

/// Set of layers a probe may hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl LayerMask {
    /// Hits nothing.
    pub const NONE: Self = Self(0);

    /// Hits every layer.
    pub const ALL: Self = Self(u32::MAX);

    /// Check if `layer` is part of this mask.
    #[inline]
    pub fn contains(self, layer: Layer) -> bool {
        (self.0 & layer.bit()) != 0
    }

    /// This mask without `layer`.
    #[inline]
    pub fn without(self, layer: Layer) -> Self {
        Self(self.0 & !layer.bit())
    }

    /// This mask with `layer` added.
    #[inline]
    pub fn with(self, layer: Layer) -> Self {
        Self(self.0 | layer.bit())
    }

    /// Mask for probes cast by a collider on `layer`.
    ///
    /// Starts from all layers, drops every layer the physics rules say
    /// `layer` ignores, then drops [`Layer::IGNORE_RAYCAST`].
    pub fn for_layer<P>(layer: Layer, physics: &P) -> Self
    where
        P: PhysicsQuery + ?Sized,
    {
        let mask = (0..LAYER_COUNT)
            .map(Layer)
            .filter(|&other| physics.ignores_layer_collision(layer, other))
            .fold(Self::ALL, Self::without);

        mask.without(Layer::IGNORE_RAYCAST)
    }
}
