mod renderer;
mod surface;

pub use renderer::{Renderer, CLEAR_COLOR};
pub use surface::{FrameSurface, RenderSurface, Rgba, RgbaRegion};
