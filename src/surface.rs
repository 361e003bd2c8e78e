use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::error::SignError;
use crate::tracker::{Point, StrokeSegment};

const STROKE_WIDTH: f64 = 2.0;
const INK_COLOR: &str = "#1B365D";

/// Owns the signature raster: sizing against the device pixel ratio,
/// stroke rendering, ink detection and PNG export.
pub struct DrawingSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    pixel_ratio: f64,
    has_ink: bool,
}

impl DrawingSurface {
    /// Wrap an existing `<canvas>` and size its raster to the on-screen box.
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, SignError> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|_| SignError::NoContext2d)?
            .ok_or(SignError::NoContext2d)?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| SignError::NoContext2d)?;

        let mut surface = Self {
            canvas,
            ctx,
            pixel_ratio: 1.0,
            has_ink: false,
        };
        surface.resize()?;
        Ok(surface)
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    pub fn width_px(&self) -> u32 {
        self.canvas.width()
    }

    pub fn height_px(&self) -> u32 {
        self.canvas.height()
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    /// Cheap ink flag, kept in sync by stamps, segments and clears. The
    /// authoritative check is [`DrawingSurface::scan_ink`].
    pub fn has_ink(&self) -> bool {
        self.has_ink
    }

    /// Resize the raster to the element box times the device pixel ratio
    /// and reset the transform so 1 logical unit = 1 CSS pixel. Prior ink
    /// is snapshotted and redrawn scaled, so a signature in progress
    /// survives a window resize.
    pub fn resize(&mut self) -> Result<(), SignError> {
        let window = web_sys::window().ok_or(SignError::DomUnavailable)?;
        let rect = self.canvas.get_bounding_client_rect();
        let ratio = window.device_pixel_ratio();
        let width = (rect.width() * ratio).round() as u32;
        let height = (rect.height() * ratio).round() as u32;

        if width == self.canvas.width()
            && height == self.canvas.height()
            && (ratio - self.pixel_ratio).abs() < f64::EPSILON
        {
            return Ok(());
        }

        let snapshot = if self.has_ink { self.snapshot()? } else { None };

        self.canvas.set_width(width);
        self.canvas.set_height(height);
        self.pixel_ratio = ratio;

        // Changing the raster dimensions resets all context state.
        self.ctx
            .set_transform(ratio, 0.0, 0.0, ratio, 0.0, 0.0)
            .map_err(|_| SignError::OpFailed("setTransform".into()))?;
        self.apply_stroke_style();

        if let Some(prev) = snapshot {
            self.ctx
                .draw_image_with_html_canvas_element_and_dw_and_dh(
                    &prev,
                    0.0,
                    0.0,
                    rect.width(),
                    rect.height(),
                )
                .map_err(|_| SignError::OpFailed("drawImage".into()))?;
        }
        Ok(())
    }

    /// Stamp a filled dot at a surface point (stroke start or bare tap).
    pub fn stamp(&mut self, p: Point) {
        let (x, y) = self.to_logical(p);
        self.ctx.begin_path();
        let _ = self.ctx.arc(x, y, STROKE_WIDTH / 2.0, 0.0, std::f64::consts::TAU);
        self.ctx.fill();
        self.has_ink = true;
    }

    /// Render one stroke segment onto the raster.
    pub fn draw_segment(&mut self, seg: StrokeSegment) {
        let (x0, y0) = self.to_logical(seg.from);
        let (x1, y1) = self.to_logical(seg.to);
        self.ctx.begin_path();
        self.ctx.move_to(x0, y0);
        self.ctx.line_to(x1, y1);
        self.ctx.stroke();
        self.has_ink = true;
    }

    /// Blank the whole raster.
    pub fn clear(&mut self) {
        let w = self.canvas.width() as f64 / self.pixel_ratio;
        let h = self.canvas.height() as f64 / self.pixel_ratio;
        self.ctx.clear_rect(0.0, 0.0, w, h);
        self.has_ink = false;
    }

    /// Authoritative ink detection: scans the alpha channel of every raster
    /// pixel. O(width x height), so it runs on submit, never per frame.
    pub fn scan_ink(&self) -> Result<bool, SignError> {
        let (w, h) = (self.canvas.width(), self.canvas.height());
        if w == 0 || h == 0 {
            return Ok(false);
        }
        let data = self
            .ctx
            .get_image_data(0.0, 0.0, w as f64, h as f64)
            .map_err(|_| SignError::OpFailed("getImageData".into()))?;
        let pixels = data.data().0;
        Ok(rgba_has_ink(&pixels))
    }

    /// Export the raster as a lossless PNG data URI.
    pub fn to_png_data_url(&self) -> Result<String, SignError> {
        self.canvas
            .to_data_url_with_type("image/png")
            .map_err(|_| SignError::OpFailed("toDataURL".into()))
    }

    fn apply_stroke_style(&self) {
        self.ctx.set_line_width(STROKE_WIDTH);
        self.ctx.set_line_cap("round");
        self.ctx.set_line_join("round");
        self.ctx.set_stroke_style_str(INK_COLOR);
        self.ctx.set_fill_style_str(INK_COLOR);
    }

    // The context carries the device-ratio transform, so surface-pixel
    // coordinates are divided back exactly once before path commands.
    fn to_logical(&self, p: Point) -> (f64, f64) {
        (p.x / self.pixel_ratio, p.y / self.pixel_ratio)
    }

    fn snapshot(&self) -> Result<Option<HtmlCanvasElement>, SignError> {
        let (w, h) = (self.canvas.width(), self.canvas.height());
        if w == 0 || h == 0 {
            return Ok(None);
        }
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or(SignError::DomUnavailable)?;
        let copy: HtmlCanvasElement = document
            .create_element("canvas")
            .map_err(|_| SignError::OpFailed("createElement(canvas)".into()))?
            .dyn_into()
            .map_err(|_| SignError::OpFailed("created element is not <canvas>".into()))?;
        copy.set_width(w);
        copy.set_height(h);
        let copy_ctx = copy
            .get_context("2d")
            .map_err(|_| SignError::NoContext2d)?
            .ok_or(SignError::NoContext2d)?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| SignError::NoContext2d)?;
        copy_ctx
            .draw_image_with_html_canvas_element(&self.canvas, 0.0, 0.0)
            .map_err(|_| SignError::OpFailed("drawImage".into()))?;
        Ok(Some(copy))
    }
}

/// True iff any pixel of an RGBA buffer has non-zero alpha.
pub fn rgba_has_ink(rgba: &[u8]) -> bool {
    rgba.iter().skip(3).step_by(4).any(|&a| a != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_buffer_has_no_ink() {
        assert!(!rgba_has_ink(&[]));
        assert!(!rgba_has_ink(&[0u8; 4 * 16]));
    }

    #[test]
    fn a_single_opaque_pixel_counts_as_ink() {
        let mut buf = vec![0u8; 4 * 16];
        buf[4 * 7 + 3] = 255;
        assert!(rgba_has_ink(&buf));
    }

    #[test]
    fn faint_alpha_still_counts() {
        let mut buf = vec![0u8; 4 * 4];
        buf[3] = 1;
        assert!(rgba_has_ink(&buf));
    }

    #[test]
    fn color_without_alpha_is_not_ink() {
        // RGB channels set, alpha untouched: cleared canvases look like this
        // after a fill that was undone by clearRect.
        let mut buf = vec![0u8; 4 * 4];
        buf[0] = 255;
        buf[1] = 255;
        buf[2] = 255;
        assert!(!rgba_has_ink(&buf));
    }
}
