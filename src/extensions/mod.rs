pub mod markers;
pub mod overlays;

pub use markers::{AlignedMarker, TradeExecution, TradeSide, align_markers, infer_bar_interval};
pub use overlays::{
    LabelPlacement, OverlayDrag, OverlayLayoutTuning, PlacedOverlay, PriceOverlay,
    layout_overlay_labels,
};
