//! Stateful drawing of field frames

pub mod colormap;
pub mod display;
pub mod draw;
pub mod panel;
pub mod session;
pub mod shared;

pub use display::{Display, FrameTap, MemoryDisplay, PngDisplay};
pub use panel::{ImageLayer, Marker, Panel, QuiverLayer};
pub use session::{RenderOptions, RenderSession, RenderTarget, UpdateReport};
pub use shared::SharedRenderSession;
