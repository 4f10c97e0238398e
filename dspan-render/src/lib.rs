pub mod render;
pub mod scene;
pub mod segments;
pub mod text;

pub use render::{Align, FrameStats, SkiaRenderer, summary_line};
pub use scene::{Scene, TrialView};
pub use text::{TextCache, load_font};

pub use ab_glyph::FontVec;
