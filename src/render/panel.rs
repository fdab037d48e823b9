//! One zoom level's plot: density image, player marker and flow arrows

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use super::colormap::plasma;
use super::draw::{draw_arrow, draw_disk, draw_line};
use super::session::RenderOptions;
use crate::constants::{
    GRID_LINE_ALPHA, GRID_LINE_DIVISIONS, PANEL_MARGIN_PX, PANEL_TITLE_PX, PLAYER_MARKER_ALPHA,
    QUIVER_ALPHA, TITLE_FONT_PX,
};
use crate::field::{ColorScale, FieldFrame, GridSpec, Matrix, VectorField};

const MARKER_COLOR: Rgb<u8> = Rgb([0, 255, 255]);
const ARROW_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const GRID_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const FRAME_COLOR: Rgb<u8> = Rgb([90, 90, 90]);
const TITLE_COLOR: Rgb<u8> = Rgb([220, 220, 220]);

/// Density image with a fixed color range
#[derive(Debug, Clone, PartialEq)]
pub struct ImageLayer {
    pub data: Matrix<f64>,
    pub scale: ColorScale,
}

impl ImageLayer {
    /// Overwrite the buffer in place; false on a shape change
    pub fn set_data(&mut self, data: &Matrix<f64>) -> bool {
        self.data.copy_from(data)
    }

    /// Bilinear sample at fractional cell coordinates (cell centers at
    /// integer positions)
    fn sample(&self, row: f64, col: f64) -> f64 {
        let (rows, cols) = self.data.shape();
        let r = row.clamp(0.0, (rows - 1) as f64);
        let c = col.clamp(0.0, (cols - 1) as f64);
        let (r0, c0) = (r.floor() as usize, c.floor() as usize);
        let (r1, c1) = ((r0 + 1).min(rows - 1), (c0 + 1).min(cols - 1));
        let (fr, fc) = (r - r0 as f64, c - c0 as f64);

        let top = self.data.get(r0, c0) * (1.0 - fc) + self.data.get(r0, c1) * fc;
        let bottom = self.data.get(r1, c0) * (1.0 - fc) + self.data.get(r1, c1) * fc;
        top * (1.0 - fr) + bottom * fr
    }
}

/// Flow arrows anchored at cell centers; masked cells are not drawn
#[derive(Debug, Clone, PartialEq)]
pub struct QuiverLayer {
    pub x: Matrix<f64>,
    pub y: Matrix<f64>,
    pub u: Matrix<f64>,
    pub v: Matrix<f64>,
    pub mask: Matrix<bool>,
}

impl QuiverLayer {
    fn from_field(field: &VectorField) -> Self {
        Self {
            x: field.x_centers.clone(),
            y: field.y_centers.clone(),
            u: field.u.clone(),
            v: field.v.clone(),
            mask: field.mask(),
        }
    }

    /// Replace vector components in place; anchors stay put
    pub fn set_uvc(&mut self, field: &VectorField) -> bool {
        if self.u.shape() != field.shape() {
            return false;
        }
        self.u.copy_from(&field.u);
        self.v.copy_from(&field.v);
        self.mask.copy_from(&field.mask());
        true
    }

    pub fn visible(&self) -> impl Iterator<Item = (f64, f64, f64, f64)> + '_ {
        let (rows, cols) = self.u.shape();
        (0..rows)
            .flat_map(move |r| (0..cols).map(move |c| (r, c)))
            .filter(move |&(r, c)| self.mask.get(r, c))
            .map(move |(r, c)| {
                (
                    self.x.get(r, c),
                    self.y.get(r, c),
                    self.u.get(r, c),
                    self.v.get(r, c),
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub center: (f64, f64),
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    zoom: f64,
    grid: GridSpec,
    title: String,
    image: ImageLayer,
    quiver: QuiverLayer,
    marker: Marker,
    generation: u32,
    updates: u64,
}

impl Panel {
    pub fn build(frame: &FieldFrame, options: &RenderOptions, generation: u32) -> Self {
        Self {
            zoom: frame.zoom,
            grid: frame.grid.clone(),
            title: format!("Density Field (Zoom: {})", frame.zoom),
            image: ImageLayer {
                data: frame.density.clone(),
                scale: frame.color_scale,
            },
            quiver: QuiverLayer::from_field(&frame.vectors),
            marker: Marker {
                center: frame.grid.center(),
                radius: options.marker_radius,
            },
            generation,
            updates: 1,
        }
    }

    /// Push new data into the existing layers. Returns false, touching
    /// nothing, when the frame's grid no longer matches this panel.
    pub fn apply(&mut self, frame: &FieldFrame) -> bool {
        if frame.grid != self.grid || frame.shape() != self.image.data.shape() {
            return false;
        }
        self.image.set_data(&frame.density);
        self.quiver.set_uvc(&frame.vectors);
        self.updates += 1;
        true
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn density(&self) -> &Matrix<f64> {
        &self.image.data
    }

    pub fn image(&self) -> &ImageLayer {
        &self.image
    }

    pub fn quiver(&self) -> &QuiverLayer {
        &self.quiver
    }

    pub fn marker(&self) -> Marker {
        self.marker
    }

    /// How many times this slot has been torn down and rebuilt
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Frames received since the last (re)build
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Outer size of a panel including title strip and margins
    pub fn outer_size(options: &RenderOptions) -> (u32, u32) {
        (
            options.panel_size + 2 * PANEL_MARGIN_PX,
            options.panel_size + PANEL_TITLE_PX + 2 * PANEL_MARGIN_PX,
        )
    }

    /// Draw into `canvas` with the panel's top-left corner at `origin_x`
    pub fn draw(
        &self,
        canvas: &mut RgbImage,
        origin_x: u32,
        options: &RenderOptions,
        font: Option<&FontVec>,
    ) {
        let plot = PlotArea {
            left: origin_x + PANEL_MARGIN_PX,
            top: PANEL_MARGIN_PX + PANEL_TITLE_PX,
            size: options.panel_size,
            grid: &self.grid,
        };

        self.draw_density(canvas, &plot);
        draw_reference_grid(canvas, &plot);

        let (cx, cy) = plot.to_pixel(self.marker.center.0, self.marker.center.1);
        draw_disk(
            canvas,
            cx,
            cy,
            plot.world_to_pixels(self.marker.radius),
            MARKER_COLOR,
            PLAYER_MARKER_ALPHA,
        );

        for (x, y, u, v) in self.quiver.visible() {
            let (x0, y0) = plot.to_pixel(x, y);
            let (x1, y1) = plot.to_pixel(x + u / options.quiver_scale, y + v / options.quiver_scale);
            draw_arrow(canvas, x0, y0, x1, y1, ARROW_COLOR, QUIVER_ALPHA);
        }

        let size = options.panel_size;
        if size > 0 {
            draw_hollow_rect_mut(
                canvas,
                Rect::at(plot.left as i32 - 1, plot.top as i32 - 1).of_size(size + 2, size + 2),
                FRAME_COLOR,
            );
        }

        if let Some(font) = font {
            draw_text_mut(
                canvas,
                TITLE_COLOR,
                plot.left as i32,
                (PANEL_MARGIN_PX / 2) as i32,
                PxScale::from(TITLE_FONT_PX),
                font,
                &self.title,
            );
        }
    }

    fn draw_density(&self, canvas: &mut RgbImage, plot: &PlotArea<'_>) {
        let (rows, cols) = self.image.data.shape();
        if rows == 0 || cols == 0 || plot.size == 0 {
            return;
        }
        let size = plot.size as f64;
        for py in 0..plot.size {
            let row = (py as f64 + 0.5) / size * rows as f64 - 0.5;
            for px in 0..plot.size {
                let col = (px as f64 + 0.5) / size * cols as f64 - 0.5;
                let value = self.image.sample(row, col);
                let color = plasma(self.image.scale.normalize(value));
                let (x, y) = (plot.left + px, plot.top + py);
                if x < canvas.width() && y < canvas.height() {
                    canvas.put_pixel(x, y, color);
                }
            }
        }
    }
}

/// Pixel placement of a panel's square plot
struct PlotArea<'a> {
    left: u32,
    top: u32,
    size: u32,
    grid: &'a GridSpec,
}

impl PlotArea<'_> {
    /// World (player-frame) coordinates to canvas pixels; y grows downward
    fn to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let g = self.grid;
        let size = self.size as f64;
        (
            self.left as f64 + (x - g.x_min) / (g.x_max - g.x_min) * size,
            self.top as f64 + (g.y_max - y) / (g.y_max - g.y_min) * size,
        )
    }

    fn world_to_pixels(&self, length: f64) -> f64 {
        length / (self.grid.x_max - self.grid.x_min) * self.size as f64
    }
}

fn draw_reference_grid(canvas: &mut RgbImage, plot: &PlotArea<'_>) {
    if plot.size == 0 {
        return;
    }
    let last = (plot.size - 1) as i32;
    for i in 1..GRID_LINE_DIVISIONS {
        let offset = (plot.size * i / GRID_LINE_DIVISIONS) as i32;
        let (left, top) = (plot.left as i32, plot.top as i32);
        draw_line(canvas, left + offset, top, left + offset, top + last, GRID_COLOR, GRID_LINE_ALPHA);
        draw_line(canvas, left, top + offset, left + last, top + offset, GRID_COLOR, GRID_LINE_ALPHA);
    }
}
