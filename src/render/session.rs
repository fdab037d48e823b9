//! Persistent, incrementally updated render surface
//!
//! A `RenderSession` starts Uninitialized. The first update opens the display
//! and builds one panel per zoom level; later updates push new data into the
//! existing layers. A panel is only torn down when its grid shape changes.

use ab_glyph::FontVec;
use image::{Rgb, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::display::Display;
use super::panel::Panel;
use crate::constants::{PANEL_SIZE_PX, PLAYER_MARKER_RADIUS, QUIVER_SCALE};
use crate::error::RenderError;
use crate::field::FieldFrame;

const BACKGROUND: Rgb<u8> = Rgb([24, 24, 28]);

/// Visual parameters fixed for the life of a session
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Side of each square plot, in pixels
    pub panel_size: u32,
    /// Player marker radius in world units
    pub marker_radius: f64,
    /// Vector units per world unit of arrow length
    pub quiver_scale: f64,
    /// TTF/OTF used for panel titles; titles are skipped without one
    pub font_path: Option<PathBuf>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            panel_size: PANEL_SIZE_PX,
            marker_radius: PLAYER_MARKER_RADIUS,
            quiver_scale: QUIVER_SCALE,
            font_path: None,
        }
    }
}

/// What an update did to the surface
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// The figure was (re)constructed on this call
    pub constructed: bool,
    /// Panels torn down and rebuilt because their grid shape changed
    pub rebuilt_panels: Vec<usize>,
}

/// Anything the pipeline can hand finished frames to
pub trait RenderTarget {
    fn render(&mut self, frames: &[FieldFrame]) -> Result<UpdateReport, RenderError>;
}

struct Figure {
    panels: Vec<Panel>,
    canvas: RgbImage,
}

enum SessionState {
    Uninitialized,
    Active(Figure),
}

pub struct RenderSession {
    id: Uuid,
    options: RenderOptions,
    display: Box<dyn Display>,
    font: Option<FontVec>,
    font_attempted: bool,
    state: SessionState,
    presents: u64,
}

impl RenderSession {
    pub fn new(options: RenderOptions, display: Box<dyn Display>) -> Self {
        Self {
            id: Uuid::new_v4(),
            options,
            display,
            font: None,
            font_attempted: false,
            state: SessionState::Uninitialized,
            presents: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active(_))
    }

    pub fn panels(&self) -> &[Panel] {
        match &self.state {
            SessionState::Active(figure) => &figure.panels,
            SessionState::Uninitialized => &[],
        }
    }

    pub fn panel(&self, index: usize) -> Option<&Panel> {
        self.panels().get(index)
    }

    /// Frames successfully handed to the display
    pub fn presents(&self) -> u64 {
        self.presents
    }

    /// Last composed figure, if the session is active
    pub fn canvas(&self) -> Option<&RgbImage> {
        match &self.state {
            SessionState::Active(figure) => Some(&figure.canvas),
            SessionState::Uninitialized => None,
        }
    }

    /// Push one frame per zoom level and flush to the display.
    ///
    /// Display failures leave any previously built figure in place so the
    /// next call can try again.
    pub fn update(&mut self, frames: &[FieldFrame]) -> Result<UpdateReport, RenderError> {
        if frames.is_empty() {
            return Ok(UpdateReport::default());
        }

        let mut report = UpdateReport::default();
        let reuse = matches!(
            &self.state,
            SessionState::Active(figure) if figure.panels.len() == frames.len()
        );

        if reuse {
            if let SessionState::Active(figure) = &mut self.state {
                for (index, (panel, frame)) in figure.panels.iter_mut().zip(frames).enumerate() {
                    if !panel.apply(frame) {
                        let generation = panel.generation() + 1;
                        *panel = Panel::build(frame, &self.options, generation);
                        report.rebuilt_panels.push(index);
                        info!(
                            session = %self.id,
                            panel = index,
                            zoom = frame.zoom,
                            rows = frame.shape().0,
                            cols = frame.shape().1,
                            "Grid shape changed, panel rebuilt"
                        );
                    }
                }
            }
        } else {
            if self.is_active() {
                info!(session = %self.id, panels = frames.len(), "Zoom level count changed, rebuilding figure");
                self.teardown();
            }
            self.construct(frames)?;
            report.constructed = true;
        }

        self.redraw()?;
        Ok(report)
    }

    /// Drop the figure and close the display; the next update starts over
    pub fn teardown(&mut self) {
        if self.is_active() {
            debug!(session = %self.id, "Render session torn down");
        }
        self.state = SessionState::Uninitialized;
        self.display.close();
    }

    fn construct(&mut self, frames: &[FieldFrame]) -> Result<(), RenderError> {
        let (panel_w, panel_h) = Panel::outer_size(&self.options);
        let width = panel_w * frames.len() as u32;
        self.display.open(width, panel_h)?;

        if !self.font_attempted {
            self.font_attempted = true;
            if let Some(path) = &self.options.font_path {
                match load_font(path) {
                    Ok(font) => self.font = Some(font),
                    Err(e) => warn!("{}; panel titles disabled", e),
                }
            }
        }

        let panels = frames
            .iter()
            .map(|frame| Panel::build(frame, &self.options, 0))
            .collect();
        self.state = SessionState::Active(Figure {
            panels,
            canvas: RgbImage::from_pixel(width, panel_h, BACKGROUND),
        });
        info!(
            session = %self.id,
            panels = frames.len(),
            width,
            height = panel_h,
            "Render session active"
        );
        Ok(())
    }

    fn redraw(&mut self) -> Result<(), RenderError> {
        let SessionState::Active(figure) = &mut self.state else {
            return Ok(());
        };
        for pixel in figure.canvas.pixels_mut() {
            *pixel = BACKGROUND;
        }
        let (panel_w, _) = Panel::outer_size(&self.options);
        for (index, panel) in figure.panels.iter().enumerate() {
            panel.draw(
                &mut figure.canvas,
                panel_w * index as u32,
                &self.options,
                self.font.as_ref(),
            );
        }

        self.display.present(&figure.canvas)?;
        self.presents += 1;
        Ok(())
    }
}

impl RenderTarget for RenderSession {
    fn render(&mut self, frames: &[FieldFrame]) -> Result<UpdateReport, RenderError> {
        self.update(frames)
    }
}

fn load_font(path: &Path) -> Result<FontVec, RenderError> {
    let font_error = |reason: String| RenderError::Font {
        path: path.display().to_string(),
        reason,
    };
    let bytes = fs::read(path).map_err(|e| font_error(e.to_string()))?;
    FontVec::try_from_vec(bytes).map_err(|e| font_error(e.to_string()))
}
