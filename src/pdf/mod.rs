//! Minimal PDF writer for the figure summary
//!
//! The whole report is vector content drawn with the standard core fonts,
//! so the document format stays small: a page tree, one Flate-compressed
//! content stream per page, four Type1 font resources and a cross-reference
//! table. No embedding, no images, no incremental updates.
//!
//! Pages accumulate as [`PageContent`] operator buffers; [`PdfDocument::save`]
//! serialises them and stamps the centred `i / N` footer once the total page
//! count is known.

pub mod backend;

use anyhow::{bail, Context, Result};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::Write as _;
use std::path::Path;

/// A4 portrait, in PDF points.
pub const PAGE_WIDTH: f64 = 595.0;
pub const PAGE_HEIGHT: f64 = 842.0;

const FOOTER_FONT_SIZE: f64 = 9.0;
const FOOTER_BASELINE: f64 = 20.0;

/// The four core-font resources every page carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    Courier,
}

impl CoreFont {
    fn resource(self) -> &'static str {
        match self {
            CoreFont::Helvetica => "F1",
            CoreFont::HelveticaBold => "F2",
            CoreFont::HelveticaOblique => "F3",
            CoreFont::Courier => "F4",
        }
    }

    fn base_font(self) -> &'static str {
        match self {
            CoreFont::Helvetica => "Helvetica",
            CoreFont::HelveticaBold => "Helvetica-Bold",
            CoreFont::HelveticaOblique => "Helvetica-Oblique",
            CoreFont::Courier => "Courier",
        }
    }

    /// Approximate advance width of a string, in points. Courier is exact
    /// (fixed 600/1000 em); the Helvetica variants use an average factor.
    pub fn text_width(self, size: f64, text: &str) -> f64 {
        let factor = match self {
            CoreFont::Courier => 0.6,
            CoreFont::HelveticaBold => 0.56,
            _ => 0.52,
        };
        factor * size * text.chars().count() as f64
    }
}

/// One page worth of content-stream operators, in PDF user space
/// (origin bottom-left, y up).
#[derive(Debug, Default)]
pub struct PageContent {
    pub(crate) ops: String,
}

impl PageContent {
    pub fn new() -> Self {
        PageContent { ops: String::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Place a text run. `y_top` is measured from the top edge of the page;
    /// the baseline sits `0.8 * size` below it.
    pub fn text(&mut self, font: CoreFont, size: f64, x: f64, y_top: f64, text: &str) {
        let baseline = PAGE_HEIGHT - y_top - 0.8 * size;
        self.ops.push_str(&format!(
            "BT /{} {:.2} Tf 0 0 0 rg {:.2} {:.2} Td ({}) Tj ET\n",
            font.resource(),
            size,
            x,
            baseline,
            escape_text(text)
        ));
    }

    /// Horizontal rule, `y_top` from the top edge.
    pub fn hline(&mut self, x0: f64, x1: f64, y_top: f64, width: f64) {
        let y = PAGE_HEIGHT - y_top;
        self.ops.push_str(&format!(
            "0 0 0 RG {:.2} w {:.2} {:.2} m {:.2} {:.2} l S\n",
            width, x0, y, x1, y
        ));
    }
}

/// Escape the characters with special meaning inside a PDF literal string.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            // Non-ASCII has no stable encoding in the core fonts.
            _ => out.push('?'),
        }
    }
    out
}

/// Append-only page list, finalized exactly once by [`save`](Self::save).
#[derive(Debug, Default)]
pub struct PdfDocument {
    pages: Vec<PageContent>,
}

impl PdfDocument {
    pub fn new() -> Self {
        PdfDocument::default()
    }

    pub fn add_page(&mut self, page: PageContent) {
        self.pages.push(page);
    }

    pub fn n_pages(&self) -> usize {
        self.pages.len()
    }

    /// Serialise the document. Object layout: 1 catalog, 2 page tree,
    /// 3..=6 fonts, then a page/stream object pair per page.
    pub fn save(&self, path: &Path) -> Result<()> {
        if self.pages.is_empty() {
            bail!("cannot save a PDF with no pages");
        }
        let total = self.pages.len();
        let n_objects = 6 + 2 * total;

        let mut buf: Vec<u8> = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n");
        // Binary marker comment so transfer tools treat the file as binary.
        buf.extend_from_slice(b"%\xc7\xec\x8f\xa2\n");

        let mut offsets = vec![0usize; n_objects + 1];

        offsets[1] = buf.len();
        buf.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

        offsets[2] = buf.len();
        let kids: Vec<String> = (0..total).map(|i| format!("{} 0 R", 7 + 2 * i)).collect();
        buf.extend_from_slice(
            format!(
                "2 0 obj\n<< /Type /Pages /Kids [ {} ] /Count {} >>\nendobj\n",
                kids.join(" "),
                total
            )
            .as_bytes(),
        );

        for (i, font) in [
            CoreFont::Helvetica,
            CoreFont::HelveticaBold,
            CoreFont::HelveticaOblique,
            CoreFont::Courier,
        ]
        .iter()
        .enumerate()
        {
            let id = 3 + i;
            offsets[id] = buf.len();
            buf.extend_from_slice(
                format!(
                    "{} 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>\nendobj\n",
                    id,
                    font.base_font()
                )
                .as_bytes(),
            );
        }

        for (i, page) in self.pages.iter().enumerate() {
            let page_id = 7 + 2 * i;
            let stream_id = page_id + 1;

            offsets[page_id] = buf.len();
            buf.extend_from_slice(
                format!(
                    "{} 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
                     /Resources << /Font << /F1 3 0 R /F2 4 0 R /F3 5 0 R /F4 6 0 R >> >> \
                     /Contents {} 0 R >>\nendobj\n",
                    page_id, PAGE_WIDTH, PAGE_HEIGHT, stream_id
                )
                .as_bytes(),
            );

            let mut ops = page.ops.clone();
            ops.push_str(&footer_ops(i + 1, total));
            let compressed = compress(ops.as_bytes())?;

            offsets[stream_id] = buf.len();
            buf.extend_from_slice(
                format!(
                    "{} 0 obj\n<< /Length {} /Filter /FlateDecode >>\nstream\n",
                    stream_id,
                    compressed.len()
                )
                .as_bytes(),
            );
            buf.extend_from_slice(&compressed);
            buf.extend_from_slice(b"\nendstream\nendobj\n");
        }

        let xref_offset = buf.len();
        buf.extend_from_slice(format!("xref\n0 {}\n", n_objects + 1).as_bytes());
        buf.extend_from_slice(b"0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            buf.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        buf.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
                n_objects + 1,
                xref_offset
            )
            .as_bytes(),
        );

        std::fs::write(path, &buf)
            .with_context(|| format!("failed to write PDF {}", path.display()))?;
        Ok(())
    }
}

fn footer_ops(page_no: usize, total: usize) -> String {
    let label = format!("{} / {}", page_no, total);
    let width = CoreFont::Helvetica.text_width(FOOTER_FONT_SIZE, &label);
    format!(
        "BT /F1 {:.2} Tf 0.3 0.3 0.3 rg {:.2} {:.2} Td ({}) Tj ET\n",
        FOOTER_FONT_SIZE,
        (PAGE_WIDTH - width) / 2.0,
        FOOTER_BASELINE,
        escape_text(&label)
    )
}

fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).context("content stream compression failed")?;
    encoder.finish().context("content stream compression failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn saved_document_has_pdf_framing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out.pdf");

        let mut doc = PdfDocument::new();
        let mut page = PageContent::new();
        page.text(CoreFont::Courier, 10.0, 72.0, 72.0, "hello (world)");
        doc.add_page(page);
        doc.add_page(PageContent::new());
        doc.save(&path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(bytes.ends_with(b"%%EOF\n"));
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Count 2"));
        assert!(text.contains("/FlateDecode"));
    }

    #[test]
    fn empty_document_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let doc = PdfDocument::new();
        assert!(doc.save(&tmp.path().join("out.pdf")).is_err());
    }

    #[test]
    fn literal_string_escaping() {
        assert_eq!(escape_text(r"a(b)c\d"), r"a\(b\)c\\d");
        assert_eq!(escape_text("naive\u{0394}"), "naive?");
    }

    #[test]
    fn courier_width_is_fixed_pitch() {
        let w = CoreFont::Courier.text_width(10.0, "abcd");
        assert!((w - 24.0).abs() < 1e-12);
    }
}
