pub mod engine;
pub mod frame;

pub use engine::{ChartEngine, ChartEngineConfig};
pub use frame::{
    FrameState, MarkerGlyph, PLACEHOLDER, RenderFrame, TickLabel, format_percent, format_price,
    format_signed,
};
