pub mod blur;
pub mod draw;
pub mod glyphs;
pub mod surface;
