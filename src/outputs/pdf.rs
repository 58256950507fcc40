//! PDF report rendering.
//!
//! Reports are a flat list of [`Block`]s. [`layout`] turns them into
//! positioned, word-wrapped lines on A4 pages; [`render_pdf`] draws those
//! lines with the built-in Helvetica fonts and a header band repeated on
//! every page.
//!
//! Widths are estimated from the font size (Helvetica averages about half
//! an em per character), which is close enough for body copy.

use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Rect, Rgb,
};
use std::error::Error;
use tracing::{debug, instrument};

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_X_MM: f32 = 20.0;
const MARGIN_TOP_MM: f32 = 32.0;
const MARGIN_BOTTOM_MM: f32 = 20.0;
const PT_TO_MM: f32 = 0.3528;
const AVG_CHAR_EM: f32 = 0.5;
const LEADING: f32 = 1.45;
const BULLET_INDENT_MM: f32 = 6.0;
const HEADER_TITLE_MAX: usize = 60;
const HEADER_SUBTITLE_MAX: usize = 90;

/// A piece of report content.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading(String),
    Paragraph(String),
    Bullets(Vec<String>),
    /// Highlighted line (rules, status figures).
    Note(String),
    /// Vertical gap in millimetres.
    Spacer(f32),
    /// Centered small print.
    Footer(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub title: String,
    pub subtitle: String,
    pub blocks: Vec<Block>,
}

/// Colour scheme as RGB fractions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    pub background: Option<(f32, f32, f32)>,
    pub title: (f32, f32, f32),
    pub subtitle: (f32, f32, f32),
    pub heading: (f32, f32, f32),
    pub text: (f32, f32, f32),
    pub accent: (f32, f32, f32),
    pub muted: (f32, f32, f32),
}

const fn hex(rgb: u32) -> (f32, f32, f32) {
    (
        ((rgb >> 16) & 0xff) as f32 / 255.0,
        ((rgb >> 8) & 0xff) as f32 / 255.0,
        (rgb & 0xff) as f32 / 255.0,
    )
}

impl Theme {
    /// Navy background with gold headings, used for downloadable resources.
    pub const fn dark() -> Self {
        Self {
            background: Some(hex(0x0b1221)),
            title: hex(0xf5f5f5),
            subtitle: hex(0xd4af37),
            heading: hex(0xd4af37),
            text: hex(0xf5f5f5),
            accent: hex(0x10b981),
            muted: hex(0x808080),
        }
    }

    /// White page with green headings, used for internal reports.
    pub const fn light() -> Self {
        Self {
            background: None,
            title: hex(0x065f46),
            subtitle: hex(0x6b7280),
            heading: hex(0x047857),
            text: hex(0x111827),
            accent: hex(0x92400e),
            muted: hex(0x6b7280),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Heading,
    Body,
    Bullet,
    Note,
    Footer,
}

impl LineStyle {
    fn size_pt(self) -> f32 {
        match self {
            LineStyle::Heading => 16.0,
            LineStyle::Body | LineStyle::Bullet | LineStyle::Note => 11.0,
            LineStyle::Footer => 10.0,
        }
    }
}

/// A positioned line of text; `y_mm` is the baseline measured from the page bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub style: LineStyle,
    pub x_mm: f32,
    pub y_mm: f32,
    /// Draw a bullet mark left of the line.
    pub bullet: bool,
}

fn char_width_mm(size_pt: f32) -> f32 {
    size_pt * PT_TO_MM * AVG_CHAR_EM
}

fn line_height_mm(size_pt: f32) -> f32 {
    size_pt * PT_TO_MM * LEADING
}

/// Greedy word wrap to at most `max_chars` per line; longer words are split.
pub fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
        if needed > max_chars && current_len > 0 {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(word.iter());
        current_len += word.len();
    }
    if current_len > 0 {
        lines.push(current);
    }
    lines
}

struct Cursor {
    pages: Vec<Vec<PlacedLine>>,
    y: f32,
}

impl Cursor {
    fn top() -> f32 {
        PAGE_HEIGHT_MM - MARGIN_TOP_MM - 10.0
    }

    fn new() -> Self {
        Self { pages: vec![Vec::new()], y: Self::top() }
    }

    fn advance(&mut self, height: f32) {
        if self.y - height < MARGIN_BOTTOM_MM {
            self.pages.push(Vec::new());
            self.y = Self::top();
        }
        self.y -= height;
    }

    fn gap(&mut self, height: f32) {
        self.y = (self.y - height).max(MARGIN_BOTTOM_MM);
    }

    fn place(&mut self, text: String, style: LineStyle, x_mm: f32, bullet: bool) {
        self.advance(line_height_mm(style.size_pt()));
        let line = PlacedLine { text, style, x_mm, y_mm: self.y, bullet };
        if let Some(page) = self.pages.last_mut() {
            page.push(line);
        }
    }

    fn wrapped(&mut self, text: &str, style: LineStyle, indent: f32, bullet: bool) {
        let width = PAGE_WIDTH_MM - 2.0 * MARGIN_X_MM - indent;
        let max_chars = (width / char_width_mm(style.size_pt())) as usize;
        for raw in text.lines() {
            if raw.trim().is_empty() {
                self.advance(line_height_mm(style.size_pt()));
                continue;
            }
            for (i, line) in wrap(raw, max_chars).into_iter().enumerate() {
                self.place(line, style, MARGIN_X_MM + indent, bullet && i == 0);
            }
        }
    }
}

/// Header band text: the title capped at 60 characters, the subtitle at 90.
pub fn header_text(report: &Report) -> (String, String) {
    (
        report.title.chars().take(HEADER_TITLE_MAX).collect(),
        report.subtitle.chars().take(HEADER_SUBTITLE_MAX).collect(),
    )
}

/// One output page: its header band and body lines.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub title: String,
    pub subtitle: String,
    pub lines: Vec<PlacedLine>,
}

/// Lay out a report and attach the header band to every page.
pub fn paginate(report: &Report) -> Vec<Page> {
    let (title, subtitle) = header_text(report);
    layout(report)
        .into_iter()
        .map(|lines| Page { title: title.clone(), subtitle: subtitle.clone(), lines })
        .collect()
}

/// Lay out the blocks of a report onto pages.
pub fn layout(report: &Report) -> Vec<Vec<PlacedLine>> {
    let mut cursor = Cursor::new();
    for block in &report.blocks {
        match block {
            Block::Heading(text) => {
                cursor.gap(2.0);
                cursor.wrapped(text, LineStyle::Heading, 0.0, false);
                cursor.gap(1.5);
            }
            Block::Paragraph(text) => cursor.wrapped(text, LineStyle::Body, 0.0, false),
            Block::Note(text) => cursor.wrapped(text, LineStyle::Note, 0.0, false),
            Block::Bullets(items) => {
                for item in items {
                    cursor.wrapped(item, LineStyle::Bullet, BULLET_INDENT_MM, true);
                }
            }
            Block::Spacer(mm) => cursor.gap(*mm),
            Block::Footer(text) => {
                let size = LineStyle::Footer.size_pt();
                cursor.gap(4.0);
                for line in wrap(text, ((PAGE_WIDTH_MM - 2.0 * MARGIN_X_MM) / char_width_mm(size)) as usize) {
                    let width = line.chars().count() as f32 * char_width_mm(size);
                    let x = ((PAGE_WIDTH_MM - width) / 2.0).max(MARGIN_X_MM);
                    cursor.place(line, LineStyle::Footer, x, false);
                }
            }
        }
    }
    cursor.pages
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

fn fill(layer: &PdfLayerReference, (r, g, b): (f32, f32, f32)) {
    layer.set_fill_color(Color::Rgb(Rgb::new(r, g, b, None)));
}

fn draw_header(layer: &PdfLayerReference, page: &Page, theme: &Theme, fonts: &Fonts) {
    if let Some(bg) = theme.background {
        fill(layer, bg);
        layer.add_rect(
            Rect::new(Mm(0.0), Mm(0.0), Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM))
                .with_mode(PaintMode::Fill),
        );
    }
    fill(layer, theme.title);
    layer.use_text(page.title.as_str(), 20.0, Mm(MARGIN_X_MM), Mm(282.0), &fonts.bold);
    if !page.subtitle.is_empty() {
        fill(layer, theme.subtitle);
        layer.use_text(page.subtitle.as_str(), 12.0, Mm(MARGIN_X_MM), Mm(274.0), &fonts.regular);
    }
}

fn draw_line(layer: &PdfLayerReference, line: &PlacedLine, theme: &Theme, fonts: &Fonts) {
    let size = line.style.size_pt();
    let (color, font) = match line.style {
        LineStyle::Heading => (theme.heading, &fonts.bold),
        LineStyle::Body | LineStyle::Bullet => (theme.text, &fonts.regular),
        LineStyle::Note => (theme.accent, &fonts.italic),
        LineStyle::Footer => (theme.muted, &fonts.regular),
    };
    if line.bullet {
        fill(layer, theme.accent);
        layer.use_text("-", size, Mm(line.x_mm - BULLET_INDENT_MM + 1.5), Mm(line.y_mm), &fonts.bold);
    }
    fill(layer, color);
    layer.use_text(line.text.clone(), size, Mm(line.x_mm), Mm(line.y_mm), font);
}

/// Render a report to PDF bytes.
#[instrument(level = "info", skip_all, fields(title = %report.title))]
pub fn render_pdf(report: &Report, theme: &Theme) -> Result<Vec<u8>, Box<dyn Error>> {
    let pages = paginate(report);
    let (doc, first_page, first_layer) = PdfDocument::new(
        report.title.as_str(),
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let fonts = Fonts {
        regular: doc.add_builtin_font(BuiltinFont::Helvetica)?,
        bold: doc.add_builtin_font(BuiltinFont::HelveticaBold)?,
        italic: doc.add_builtin_font(BuiltinFont::HelveticaOblique)?,
    };

    for (index, page) in pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            doc.get_page(page).get_layer(layer)
        };
        draw_header(&layer, page, theme, &fonts);
        for line in &page.lines {
            draw_line(&layer, line, theme, &fonts);
        }
    }

    let bytes = doc.save_to_bytes()?;
    debug!(pages = pages.len(), bytes = bytes.len(), "Rendered PDF");
    Ok(bytes)
}
