pub mod canvas;
mod glyphs;
pub mod overlay;
