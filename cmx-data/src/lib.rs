//! Visual encodings and lookups derived from backend results.
//!
//! This crate turns decoded backend records into things a map can draw:
//! colors per model, categories per gridpoint, equivalence sets per
//! composite key, and the bounds to frame.

pub mod color;
pub mod equivalence;

pub use color::{Color, ColorMap, Hsl};
pub use equivalence::EquivalenceIndex;

/// ANOVA effect categories for the interaction view.
pub mod classify {
    use crate::color::Color;
    use cmx_core::GridPoint;
    use serde::Serialize;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub enum Category {
        Interaction,
        OnlyGcm,
        OnlyRcm,
        Both,
        NoEffect,
    }

    impl Category {
        /// Legend order.
        pub const ALL: [Category; 5] = [
            Category::Interaction,
            Category::OnlyGcm,
            Category::OnlyRcm,
            Category::Both,
            Category::NoEffect,
        ];

        pub fn label(&self) -> &'static str {
            match self {
                Category::Interaction => "Interaction",
                Category::OnlyGcm => "Only GCM",
                Category::OnlyRcm => "Only RCM",
                Category::Both => "RCM and GCM",
                Category::NoEffect => "None",
            }
        }

        pub fn color(&self) -> Color {
            match self {
                Category::Interaction => Color::Named("yellow"),
                Category::OnlyGcm => Color::Named("blue"),
                Category::OnlyRcm => Color::Named("red"),
                Category::Both => Color::Named("purple"),
                Category::NoEffect => Color::Named("green"),
            }
        }
    }

    /// An interaction effect dominates whatever the individual effects say.
    pub fn classify(point: &GridPoint) -> Category {
        if point.interaction_effect {
            Category::Interaction
        } else if point.gcm_effect && point.rcm_effect {
            Category::Both
        } else if point.gcm_effect {
            Category::OnlyGcm
        } else if point.rcm_effect {
            Category::OnlyRcm
        } else {
            Category::NoEffect
        }
    }

}

/// Viewport framing for the map.
pub mod viewport {
    use cmx_core::{BoundingBox, RegionBoundsTable};

    /// Bounds to frame for the current result set.
    ///
    /// A selected region that is in `table` gets its fixed box. Otherwise the
    /// box covers every coordinate. `None` means keep the current viewport.
    pub fn compute_bounds<I>(
        coordinates: I,
        selected_region: Option<&str>,
        table: &RegionBoundsTable,
    ) -> Option<BoundingBox>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        if let Some(bounds) = selected_region.and_then(|r| table.get(r)) {
            return Some(*bounds);
        }
        BoundingBox::covering(coordinates)
    }

    /// Holds the last framed viewport so "no change" keeps it.
    #[derive(Debug, Clone, Default)]
    pub struct MapViewSync {
        current: Option<BoundingBox>,
    }

    impl MapViewSync {
        pub fn new(initial: Option<BoundingBox>) -> Self {
            Self { current: initial }
        }

        /// Apply a computed target. Returns true when the viewport moved.
        pub fn update(&mut self, target: Option<BoundingBox>) -> bool {
            match target {
                Some(b) if self.current != Some(b) => {
                    self.current = Some(b);
                    true
                }
                _ => false,
            }
        }

        pub fn current(&self) -> Option<BoundingBox> {
            self.current
        }
    }

}
