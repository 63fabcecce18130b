use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::PriceScale;
use crate::error::{ChartError, ChartResult};

/// Horizontal price-level annotation drawn across the chart.
///
/// Overlays are rebuilt each render from current derived prices and are
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceOverlay {
    pub id: String,
    pub price: f64,
    pub label: String,
    pub color: String,
    #[serde(default)]
    pub dashed: bool,
    #[serde(default)]
    pub draggable: bool,
}

impl PriceOverlay {
    #[must_use]
    pub fn new(id: impl Into<String>, price: f64, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            price,
            label: label.into(),
            color: "#888888".to_owned(),
            dashed: false,
            draggable: false,
        }
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    #[must_use]
    pub fn dashed(mut self) -> Self {
        self.dashed = true;
        self
    }

    #[must_use]
    pub fn draggable(mut self) -> Self {
        self.draggable = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelPlacement {
    Above,
    Below,
}

impl LabelPlacement {
    #[must_use]
    fn flipped(self) -> Self {
        match self {
            LabelPlacement::Above => LabelPlacement::Below,
            LabelPlacement::Below => LabelPlacement::Above,
        }
    }
}

/// Tuning controls for overlay label collision avoidance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayLayoutTuning {
    /// Overlays closer than this on the Y axis count as clustered.
    pub cluster_distance_px: f64,
    /// Labels at or above this length flip away from their predecessor.
    pub long_label_chars: usize,
}

impl Default for OverlayLayoutTuning {
    fn default() -> Self {
        Self {
            cluster_distance_px: 18.0,
            long_label_chars: 12,
        }
    }
}

impl OverlayLayoutTuning {
    pub fn validate(self) -> ChartResult<Self> {
        if !self.cluster_distance_px.is_finite() || self.cluster_distance_px <= 0.0 {
            return Err(ChartError::InvalidConfig(
                "overlay cluster distance must be finite and > 0".to_owned(),
            ));
        }
        if self.long_label_chars == 0 {
            return Err(ChartError::InvalidConfig(
                "overlay long label threshold must be > 0".to_owned(),
            ));
        }
        Ok(self)
    }
}

/// An overlay with its line Y and resolved label placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedOverlay {
    pub overlay: PriceOverlay,
    pub y: f64,
    pub placement: LabelPlacement,
}

/// Arranges overlay labels so y-adjacent clustered overlays never share a
/// placement.
///
/// Single greedy pass over overlays sorted by pixel Y: a label defaults to
/// sitting above its line, and flips relative to its predecessor when the two
/// lines are clustered or the label is long enough to spill into it. Adjacent
/// pairs are guaranteed collision-free; non-adjacent pairs are not globally
/// optimized, which is acceptable for the handful of overlays a chart shows.
#[must_use]
pub fn layout_overlay_labels(
    overlays: &[PriceOverlay],
    price_scale: PriceScale,
    pane_height: f64,
    tuning: OverlayLayoutTuning,
) -> Vec<PlacedOverlay> {
    let mut placed: Vec<PlacedOverlay> = overlays
        .iter()
        .map(|overlay| PlacedOverlay {
            overlay: overlay.clone(),
            y: price_scale.price_to_pixel(overlay.price, pane_height),
            placement: LabelPlacement::Above,
        })
        .collect();

    placed.sort_by_key(|entry| OrderedFloat(entry.y));

    let mut previous: Option<(f64, LabelPlacement)> = None;
    for entry in &mut placed {
        let placement = match previous {
            Some((prev_y, prev_placement))
                if (entry.y - prev_y).abs() < tuning.cluster_distance_px
                    || entry.overlay.label.chars().count() >= tuning.long_label_chars =>
            {
                prev_placement.flipped()
            }
            _ => LabelPlacement::Above,
        };
        entry.placement = placement;
        previous = Some((entry.y, placement));
    }

    placed
}

/// Overlay-line drag gesture.
///
/// Like pan, the gesture must be cleared on every exit path; `update` maps
/// the pointer's pane Y back to a price through the scale inverse.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OverlayDrag {
    active_id: Option<String>,
}

impl OverlayDrag {
    #[must_use]
    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn begin(&mut self, overlay_id: impl Into<String>) {
        self.active_id = Some(overlay_id.into());
    }

    /// Returns the dragged overlay's id and its new price for the pointer Y,
    /// or `None` when no drag is active.
    pub fn update(
        &self,
        pointer_y: f64,
        price_scale: PriceScale,
        pane_height: f64,
    ) -> Option<(&str, f64)> {
        let id = self.active_id.as_deref()?;
        Some((id, price_scale.pixel_to_price(pointer_y, pane_height)))
    }

    pub fn end(&mut self) {
        self.active_id = None;
    }

    pub fn cancel(&mut self) {
        self.active_id = None;
    }
}
