pub mod candlestick;
pub mod price_scale;
pub mod primitives;
pub mod types;
pub mod viewport;

pub use candlestick::{CandleGeometry, VolumeBarGeometry, project_candles, project_volume_bars};
pub use price_scale::{PriceScale, PriceScaleTuning, PriceTicks};
pub use types::{Bar, Direction, Position, PriceQuote, Viewport};
pub use viewport::{
    PanGesture, ViewportState, ViewportTuning, VisibleWindow, ZoomDirection, pan, resize,
    visible_bar_capacity, visible_window, zoom,
};
