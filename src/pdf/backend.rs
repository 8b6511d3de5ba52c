//! `plotters` drawing backend targeting a PDF page content stream
//!
//! Coordinates arrive in plotters' screen convention (origin top-left, y
//! down) and are flipped into PDF user space. Everything stays vector:
//! lines, rectangles, Bezier circles and core-font text runs. Alpha has no
//! operator in the plain content stream, so translucent colors are blended
//! toward the white page background, which matches how the mesh grid lines
//! are meant to read.

use super::{escape_text, CoreFont, PageContent, PAGE_HEIGHT, PAGE_WIDTH};
use plotters_backend::text_anchor::{HPos, VPos};
use plotters_backend::{
    BackendColor, BackendCoord, BackendStyle, BackendTextStyle, DrawingBackend, DrawingErrorKind,
    FontFamily, FontStyle, FontTransform,
};
use std::error::Error;
use std::fmt;

/// Bezier circle constant, 4/3 * (sqrt(2) - 1).
const ARC_K: f64 = 0.552_284_749_831;

/// Average glyph advance as a fraction of the font size.
const TEXT_WIDTH_FACTOR: f64 = 0.6;

/// Writing into an in-memory operator buffer cannot fail, but the backend
/// trait wants an error type.
#[derive(Debug)]
pub struct PdfBackendError;

impl fmt::Display for PdfBackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PDF backend error")
    }
}

impl Error for PdfBackendError {}

/// Vector drawing surface over one A4 [`PageContent`].
pub struct PdfBackend<'a> {
    page: &'a mut PageContent,
}

impl<'a> PdfBackend<'a> {
    pub fn new(page: &'a mut PageContent) -> Self {
        PdfBackend { page }
    }

    fn y(&self, y: i32) -> f64 {
        PAGE_HEIGHT - y as f64
    }

    /// `r g b` components in [0, 1], alpha pre-blended against white.
    fn rgb(color: BackendColor) -> (f64, f64, f64) {
        let a = color.alpha.clamp(0.0, 1.0);
        let blend = |c: u8| (c as f64 / 255.0) * a + (1.0 - a);
        (blend(color.rgb.0), blend(color.rgb.1), blend(color.rgb.2))
    }

    fn push(&mut self, op: &str) {
        self.page.ops.push_str(op);
    }

    fn set_stroke(&mut self, color: BackendColor, width: u32) {
        let (r, g, b) = Self::rgb(color);
        self.push(&format!("{:.3} {:.3} {:.3} RG {} w\n", r, g, b, width.max(1)));
    }

    fn set_fill(&mut self, color: BackendColor) {
        let (r, g, b) = Self::rgb(color);
        self.push(&format!("{:.3} {:.3} {:.3} rg\n", r, g, b));
    }
}

impl<'a> DrawingBackend for PdfBackend<'a> {
    type ErrorType = PdfBackendError;

    fn get_size(&self) -> (u32, u32) {
        (PAGE_WIDTH as u32, PAGE_HEIGHT as u32)
    }

    fn ensure_prepared(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        Ok(())
    }

    fn present(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        Ok(())
    }

    fn draw_pixel(
        &mut self,
        point: BackendCoord,
        color: BackendColor,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        if color.alpha <= 0.0 {
            return Ok(());
        }
        self.set_fill(color);
        let y = self.y(point.1);
        self.push(&format!("{} {:.2} 1 1 re f\n", point.0, y - 1.0));
        Ok(())
    }

    fn draw_line<S: BackendStyle>(
        &mut self,
        from: BackendCoord,
        to: BackendCoord,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        if style.color().alpha <= 0.0 {
            return Ok(());
        }
        self.set_stroke(style.color(), style.stroke_width());
        let (y0, y1) = (self.y(from.1), self.y(to.1));
        self.push(&format!(
            "{} {:.2} m {} {:.2} l S\n",
            from.0, y0, to.0, y1
        ));
        Ok(())
    }

    fn draw_rect<S: BackendStyle>(
        &mut self,
        upper_left: BackendCoord,
        bottom_right: BackendCoord,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        if style.color().alpha <= 0.0 {
            return Ok(());
        }
        let w = (bottom_right.0 - upper_left.0).abs();
        let h = (bottom_right.1 - upper_left.1).abs();
        let y = self.y(upper_left.1.max(bottom_right.1));
        let x = upper_left.0.min(bottom_right.0);
        if fill {
            self.set_fill(style.color());
            self.push(&format!("{} {:.2} {} {} re f\n", x, y, w, h));
        } else {
            self.set_stroke(style.color(), style.stroke_width());
            self.push(&format!("{} {:.2} {} {} re S\n", x, y, w, h));
        }
        Ok(())
    }

    fn draw_path<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        path: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        if style.color().alpha <= 0.0 {
            return Ok(());
        }
        let points: Vec<BackendCoord> = path.into_iter().collect();
        if points.len() < 2 {
            return Ok(());
        }
        self.set_stroke(style.color(), style.stroke_width());
        let mut ops = format!("{} {:.2} m", points[0].0, self.y(points[0].1));
        for p in &points[1..] {
            ops.push_str(&format!(" {} {:.2} l", p.0, self.y(p.1)));
        }
        ops.push_str(" S\n");
        self.push(&ops);
        Ok(())
    }

    fn draw_circle<S: BackendStyle>(
        &mut self,
        center: BackendCoord,
        radius: u32,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        if style.color().alpha <= 0.0 {
            return Ok(());
        }
        let (cx, cy) = (center.0 as f64, self.y(center.1));
        let r = radius as f64;
        let k = ARC_K * r;
        let mut ops = String::new();
        ops.push_str(&format!("{:.2} {:.2} m\n", cx + r, cy));
        ops.push_str(&format!(
            "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c\n",
            cx + r, cy + k, cx + k, cy + r, cx, cy + r
        ));
        ops.push_str(&format!(
            "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c\n",
            cx - k, cy + r, cx - r, cy + k, cx - r, cy
        ));
        ops.push_str(&format!(
            "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c\n",
            cx - r, cy - k, cx - k, cy - r, cx, cy - r
        ));
        ops.push_str(&format!(
            "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c\n",
            cx + k, cy - r, cx + r, cy - k, cx + r, cy
        ));
        if fill {
            self.set_fill(style.color());
            ops.push_str("f\n");
        } else {
            self.set_stroke(style.color(), style.stroke_width());
            ops.push_str("S\n");
        }
        self.push(&ops);
        Ok(())
    }

    fn fill_polygon<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        vert: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        if style.color().alpha <= 0.0 {
            return Ok(());
        }
        let points: Vec<BackendCoord> = vert.into_iter().collect();
        if points.len() < 3 {
            return Ok(());
        }
        self.set_fill(style.color());
        let mut ops = format!("{} {:.2} m", points[0].0, self.y(points[0].1));
        for p in &points[1..] {
            ops.push_str(&format!(" {} {:.2} l", p.0, self.y(p.1)));
        }
        ops.push_str(" h f\n");
        self.push(&ops);
        Ok(())
    }

    fn draw_text<TStyle: BackendTextStyle>(
        &mut self,
        text: &str,
        style: &TStyle,
        pos: BackendCoord,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        if text.is_empty() || style.color().alpha <= 0.0 {
            return Ok(());
        }
        let size = style.size();
        let font = match (style.family(), style.style()) {
            (FontFamily::Monospace, _) => CoreFont::Courier,
            (_, FontStyle::Bold) => CoreFont::HelveticaBold,
            (_, FontStyle::Italic) | (_, FontStyle::Oblique) => CoreFont::HelveticaOblique,
            _ => CoreFont::Helvetica,
        };
        let (tw, th) = self.estimate_text_size(text, style)?;
        let (tw, th) = (tw as f64, th as f64);

        // Text direction u and screen-down direction v, in PDF space.
        let (ux, uy, vx, vy) = match style.transform() {
            FontTransform::Rotate90 => (0.0, -1.0, -1.0, 0.0),
            FontTransform::Rotate180 => (-1.0, 0.0, 0.0, 1.0),
            FontTransform::Rotate270 => (0.0, 1.0, 1.0, 0.0),
            _ => (1.0, 0.0, 0.0, -1.0),
        };
        let along = match style.anchor().h_pos {
            HPos::Left => 0.0,
            HPos::Center => -tw / 2.0,
            HPos::Right => -tw,
        };
        let top = match style.anchor().v_pos {
            VPos::Top => 0.0,
            VPos::Center => -th / 2.0,
            VPos::Bottom => -th,
        };
        let to_baseline = top + 0.8 * size;

        let px = pos.0 as f64;
        let py = self.y(pos.1);
        let bx = px + ux * along + vx * to_baseline;
        let by = py + uy * along + vy * to_baseline;

        let (r, g, b) = Self::rgb(style.color());
        self.push(&format!(
            "BT /{} {:.2} Tf {:.3} {:.3} {:.3} rg {:.3} {:.3} {:.3} {:.3} {:.2} {:.2} Tm ({}) Tj ET\n",
            font.resource(),
            size,
            r,
            g,
            b,
            ux,
            uy,
            -vx,
            -vy,
            bx,
            by,
            escape_text(text)
        ));
        Ok(())
    }

    fn estimate_text_size<TStyle: BackendTextStyle>(
        &self,
        text: &str,
        style: &TStyle,
    ) -> Result<(u32, u32), DrawingErrorKind<Self::ErrorType>> {
        let width = TEXT_WIDTH_FACTOR * style.size() * text.chars().count() as f64;
        Ok((width.ceil() as u32, style.size().ceil() as u32))
    }

    fn blit_bitmap(
        &mut self,
        _pos: BackendCoord,
        _size: (u32, u32),
        _src: &[u8],
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        // Raster content never occurs in this report.
        Ok(())
    }
}
