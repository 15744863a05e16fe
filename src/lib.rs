//! Lock-screen background compositor.
//!
//! Loads a background image, applies optional blur and darkening, and paints
//! it onto a fixed-size pixmap under one of the fit/alignment modes.

pub mod config;
pub mod loader;
pub mod placement;
pub mod render;
pub mod processing {
    pub mod blur;
    pub mod darken;
}
