// Paginated PDF timetable: one page layout per section.

use ::image::RgbImage;
use chrono::NaiveDate;
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::*;
use std::io::BufWriter;
use tracing::{debug, info};

use crate::assets::BrandImages;
use crate::config::Branding;
use crate::error::ExportError;
use crate::format::{self, NOT_AVAILABLE};
use crate::model::{ScheduleType, UserInfo};
use crate::placement::{Diagnostics, GridCell, TimetableGrid};
use crate::section::SectionTimetable;
use crate::time_grid::{TIME_SLOTS, WEEKDAYS};

// ============================================================================
// Constants
// ============================================================================

/// 8 x 13 inch portrait page in mm
const PAGE_WIDTH_MM: f32 = 203.2;
const PAGE_HEIGHT_MM: f32 = 330.2;

/// Margins
const MARGIN_MM: f32 = 12.7;

/// Space kept free at the bottom of every page for the footer
const FOOTER_HEIGHT_MM: f32 = 14.0;

const LOGO_SIZE_MM: f32 = 20.0;
const AVATAR_SIZE_MM: f32 = 22.0;
const INFO_BOX_HEIGHT_MM: f32 = 28.0;

/// Timetable geometry
const TIME_COL_WIDTH_MM: f32 = 24.0;
const GRID_HEADER_HEIGHT_MM: f32 = 8.0;
const BASE_ROW_HEIGHT_MM: f32 = 14.0;

/// Course summary geometry
const SUMMARY_TITLE_HEIGHT_MM: f32 = 8.0;
const SUMMARY_HEADER_HEIGHT_MM: f32 = 7.0;
const SUMMARY_LINE_HEIGHT_MM: f32 = 4.0;
const UNITS_COL_WIDTH_MM: f32 = 18.0;
const CODE_COL_WIDTH_MM: f32 = 36.0;

/// Font sizes in points
const TITLE_FONT_SIZE: f32 = 13.0;
const HEADER_FONT_SIZE: f32 = 10.0;
const NORMAL_FONT_SIZE: f32 = 9.0;
const SMALL_FONT_SIZE: f32 = 7.5;
const TINY_FONT_SIZE: f32 = 6.0;

/// Average Helvetica glyph width as a fraction of the font size
const AVG_GLYPH_EM: f32 = 0.52;
const PT_TO_MM: f32 = 0.3528;

/// Fill colors (RGB 0..1)
const LECTURE_TINT: (f32, f32, f32) = (0.86, 0.92, 0.99);
const LAB_TINT: (f32, f32, f32) = (0.99, 0.92, 0.80);
const HEADER_FILL: (f32, f32, f32) = (0.82, 0.85, 0.90);
const INFO_FILL: (f32, f32, f32) = (0.96, 0.96, 0.96);
const STRIPE_FILL: (f32, f32, f32) = (0.94, 0.95, 0.97);

// ============================================================================
// Public API
// ============================================================================

/// Shared inputs for every page of one export.
pub struct DocumentContext<'a> {
    pub user: &'a UserInfo,
    pub branding: &'a Branding,
    pub brand: &'a BrandImages,
    pub avatar: Option<&'a RgbImage>,
    pub export_date: NaiveDate,
}

/// Where a section starts in the finished document (1-based page).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionPage {
    pub section_name: String,
    pub first_page: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentReport {
    pub pages: usize,
    pub sections: Vec<SectionPage>,
    pub diagnostics: Diagnostics,
}

pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub report: DocumentReport,
}

/// Render every section into one PDF held in memory.
pub fn render_document(
    sections: &[SectionTimetable<'_>],
    ctx: &DocumentContext<'_>,
) -> Result<RenderedDocument, ExportError> {
    if sections.is_empty() {
        return Err(ExportError::EmptySchedule);
    }

    let mut canvas = Canvas::new("Class Schedule")?;
    let mut report = DocumentReport::default();

    for section in sections {
        canvas.start_page();
        report.sections.push(SectionPage {
            section_name: section.details.section_name.clone(),
            first_page: canvas.page_number(),
        });

        draw_institution_header(&mut canvas, ctx);
        draw_info_box(&mut canvas, section, ctx);
        draw_timetable(&mut canvas, &section.grid);
        draw_course_summary(&mut canvas, section);

        report.diagnostics.extend(section.diagnostics.clone());
    }

    draw_footers(&canvas, ctx);
    report.pages = canvas.pages.len();

    let mut writer = BufWriter::new(Vec::new());
    canvas
        .doc
        .save(&mut writer)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Pdf(e.to_string()))?;

    info!(pages = report.pages, sections = report.sections.len(), "document rendered");
    Ok(RenderedDocument { bytes, report })
}

// ============================================================================
// Canvas
// ============================================================================

/// The document under construction plus the write cursor on its last page.
struct Canvas {
    doc: PdfDocumentReference,
    font_regular: IndirectFontRef,
    font_bold: IndirectFontRef,
    pages: Vec<(PdfPageIndex, PdfLayerIndex)>,
    layer: PdfLayerReference,
    y: f32,
    first_page_unused: bool,
}

impl Canvas {
    fn new(title: &str) -> Result<Canvas, ExportError> {
        let (doc, page1, layer1) =
            PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
        let layer = doc.get_page(page1).get_layer(layer1);

        let font_regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ExportError::Pdf(e.to_string()))?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ExportError::Pdf(e.to_string()))?;

        Ok(Canvas {
            doc,
            font_regular,
            font_bold,
            pages: vec![(page1, layer1)],
            layer,
            y: PAGE_HEIGHT_MM - MARGIN_MM,
            first_page_unused: true,
        })
    }

    /// Move to a fresh page; the document's initial page is used first.
    fn start_page(&mut self) {
        if self.first_page_unused {
            self.first_page_unused = false;
        } else {
            let (page, layer) =
                self.doc
                    .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.pages.push((page, layer));
            debug!(page = self.pages.len(), "page break");
        }
        self.y = PAGE_HEIGHT_MM - MARGIN_MM;
    }

    fn page_number(&self) -> usize {
        self.pages.len()
    }

    /// Whether `height` more mm fit above the footer.
    fn fits(&self, height: f32) -> bool {
        self.y - height >= MARGIN_MM + FOOTER_HEIGHT_MM
    }
}

fn content_width() -> f32 {
    PAGE_WIDTH_MM - 2.0 * MARGIN_MM
}

// ============================================================================
// Header & Info Box
// ============================================================================

fn draw_institution_header(canvas: &mut Canvas, ctx: &DocumentContext<'_>) {
    let top = canvas.y;
    let right_edge = MARGIN_MM + content_width();

    // Logos: first on the left, the others from the right edge inward
    let logo_x = [
        MARGIN_MM,
        right_edge - LOGO_SIZE_MM,
        right_edge - 2.0 * LOGO_SIZE_MM - 3.0,
    ];
    for (logo, x) in ctx.brand.logos.iter().zip(logo_x) {
        if let Some(img) = logo {
            let (w, h) = fit_within(img, LOGO_SIZE_MM, LOGO_SIZE_MM);
            embed_rgb(&canvas.layer, img, x + (LOGO_SIZE_MM - w) / 2.0, top - h, w);
        }
    }

    // Title block, centered
    let center_x = PAGE_WIDTH_MM / 2.0;
    let mut line_y = top - 5.0;
    for (i, line) in ctx.branding.header_lines.iter().enumerate() {
        let (size, font) = if i == 0 {
            (TITLE_FONT_SIZE, &canvas.font_bold)
        } else {
            (NORMAL_FONT_SIZE, &canvas.font_regular)
        };
        centered_text(&canvas.layer, line, size, center_x, line_y, font);
        line_y -= if i == 0 { 6.0 } else { 4.5 };
    }

    let title_height = top - line_y;
    let header_height = title_height.max(LOGO_SIZE_MM) + 3.0;
    canvas.y = top - header_height;

    // Separator
    set_stroke(&canvas.layer, (0.0, 0.0, 0.0), 0.8);
    draw_line(&canvas.layer, MARGIN_MM, canvas.y, right_edge, canvas.y);
    canvas.y -= 4.0;
}

fn draw_info_box(canvas: &mut Canvas, section: &SectionTimetable<'_>, ctx: &DocumentContext<'_>) {
    let top = canvas.y;
    let width = content_width();
    let layer = &canvas.layer;

    fill_rect(layer, MARGIN_MM, top, width, INFO_BOX_HEIGHT_MM, INFO_FILL);
    set_stroke(layer, (0.6, 0.6, 0.6), 0.4);
    stroke_rect(layer, MARGIN_MM, top, width, INFO_BOX_HEIGHT_MM);

    let avatar_space = if ctx.avatar.is_some() {
        AVATAR_SIZE_MM + 6.0
    } else {
        0.0
    };
    let left_x = MARGIN_MM + 4.0;
    let right_x = MARGIN_MM + width * 0.48;
    let left_value_width = right_x - left_x - 22.0;
    let right_value_width = MARGIN_MM + width - avatar_space - right_x - 28.0;

    let details = &section.details;
    let name = ctx
        .user
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(NOT_AVAILABLE);
    let left = [
        ("Name:", name.to_string()),
        ("Section:", details.section_name.clone()),
        ("Adviser:", details.adviser_name.clone()),
    ];
    let right = [
        ("Date Exported:", ctx.export_date.format("%B %-d, %Y").to_string()),
        ("Total Classes:", section.total_classes().to_string()),
        ("Shift:", details.shift.clone()),
    ];

    let mut row_y = top - 7.5;
    for ((l_label, l_value), (r_label, r_value)) in left.iter().zip(right.iter()) {
        layer.use_text(*l_label, NORMAL_FONT_SIZE, Mm(left_x), Mm(row_y), &canvas.font_bold);
        layer.use_text(
            fit_text(l_value, NORMAL_FONT_SIZE, left_value_width),
            NORMAL_FONT_SIZE,
            Mm(left_x + 20.0),
            Mm(row_y),
            &canvas.font_regular,
        );
        layer.use_text(*r_label, NORMAL_FONT_SIZE, Mm(right_x), Mm(row_y), &canvas.font_bold);
        layer.use_text(
            fit_text(r_value, NORMAL_FONT_SIZE, right_value_width),
            NORMAL_FONT_SIZE,
            Mm(right_x + 26.0),
            Mm(row_y),
            &canvas.font_regular,
        );
        row_y -= 7.5;
    }

    // Avatar, vertically centered on the right
    if let Some(avatar) = ctx.avatar {
        let x = MARGIN_MM + width - AVATAR_SIZE_MM - 3.0;
        let y = top - INFO_BOX_HEIGHT_MM + (INFO_BOX_HEIGHT_MM - AVATAR_SIZE_MM) / 2.0;
        embed_rgb(layer, avatar, x, y, AVATAR_SIZE_MM);
    }

    canvas.y = top - INFO_BOX_HEIGHT_MM - 5.0;
}

// ============================================================================
// Timetable Grid
// ============================================================================

fn day_col_width() -> f32 {
    (content_width() - TIME_COL_WIDTH_MM) / WEEKDAYS.len() as f32
}

fn draw_timetable(canvas: &mut Canvas, grid: &TimetableGrid<'_>) {
    if !canvas.fits(GRID_HEADER_HEIGHT_MM + BASE_ROW_HEIGHT_MM) {
        canvas.start_page();
    }
    draw_grid_header(canvas);

    // Rows joined by a multi-slot class stay on the same page
    for group in grid.row_groups() {
        let group_height = group.len() as f32 * BASE_ROW_HEIGHT_MM;
        if !canvas.fits(group_height) {
            debug!(first_row = group.start, "timetable continues on next page");
            canvas.start_page();
            draw_grid_header(canvas);
        }

        for row in group {
            draw_grid_row(canvas, grid, row);
            canvas.y -= BASE_ROW_HEIGHT_MM;
        }
    }

    canvas.y -= 6.0;
}

fn draw_grid_header(canvas: &mut Canvas) {
    let top = canvas.y;
    let layer = &canvas.layer;
    let day_width = day_col_width();

    fill_rect(layer, MARGIN_MM, top, content_width(), GRID_HEADER_HEIGHT_MM, HEADER_FILL);
    set_stroke(layer, (0.3, 0.3, 0.3), 0.4);

    let text_y = top - GRID_HEADER_HEIGHT_MM / 2.0 - 1.2;
    stroke_rect(layer, MARGIN_MM, top, TIME_COL_WIDTH_MM, GRID_HEADER_HEIGHT_MM);
    centered_text(
        layer,
        "TIME",
        SMALL_FONT_SIZE,
        MARGIN_MM + TIME_COL_WIDTH_MM / 2.0,
        text_y,
        &canvas.font_bold,
    );

    for (i, day) in WEEKDAYS.iter().enumerate() {
        let x = MARGIN_MM + TIME_COL_WIDTH_MM + i as f32 * day_width;
        stroke_rect(layer, x, top, day_width, GRID_HEADER_HEIGHT_MM);
        centered_text(
            layer,
            &day.name().to_uppercase(),
            SMALL_FONT_SIZE,
            x + day_width / 2.0,
            text_y,
            &canvas.font_bold,
        );
    }

    canvas.y -= GRID_HEADER_HEIGHT_MM;
}

fn draw_grid_row(canvas: &Canvas, grid: &TimetableGrid<'_>, row: usize) {
    let top = canvas.y;
    let layer = &canvas.layer;
    let day_width = day_col_width();

    // Time column
    set_stroke(layer, (0.3, 0.3, 0.3), 0.4);
    stroke_rect(layer, MARGIN_MM, top, TIME_COL_WIDTH_MM, BASE_ROW_HEIGHT_MM);
    let slot = &TIME_SLOTS[row];
    let font = if slot.label.is_some() {
        &canvas.font_bold
    } else {
        &canvas.font_regular
    };
    centered_text(
        layer,
        &slot.display_label(),
        SMALL_FONT_SIZE,
        MARGIN_MM + TIME_COL_WIDTH_MM / 2.0,
        top - BASE_ROW_HEIGHT_MM / 2.0 - 1.2,
        font,
    );

    for (col, cell) in grid.row(row).iter().enumerate() {
        let x = MARGIN_MM + TIME_COL_WIDTH_MM + col as f32 * day_width;
        if cell.is_primary() {
            draw_class_block(canvas, cell, x, top, day_width);
        } else if !cell.is_occupied {
            set_stroke(layer, (0.3, 0.3, 0.3), 0.4);
            stroke_rect(layer, x, top, day_width, BASE_ROW_HEIGHT_MM);
        }
    }
}

/// A primary cell drawn over its whole span.
fn draw_class_block(canvas: &Canvas, cell: &GridCell<'_>, x: f32, top: f32, width: f32) {
    let layer = &canvas.layer;
    let height = cell.row_span as f32 * BASE_ROW_HEIGHT_MM;

    let (tint, hours) = match cell.source {
        Some(record) => (
            match record.schedule_type {
                ScheduleType::Lecture => LECTURE_TINT,
                ScheduleType::Lab => LAB_TINT,
            },
            format::duration_hours(record),
        ),
        None => (LECTURE_TINT, cell.row_span as f32),
    };
    let profile = format::font_profile(hours);

    fill_rect(layer, x, top, width, height, tint);
    set_stroke(layer, (0.3, 0.3, 0.3), 0.4);
    stroke_rect(layer, x, top, width, height);

    // Center the text block vertically
    let lines: Vec<&str> = cell.content.lines().collect();
    let block_height = lines.len() as f32 * profile.line_height;
    let mut line_y = top - (height - block_height) / 2.0 - profile.line_height * 0.8;
    let center_x = x + width / 2.0;

    for (i, line) in lines.iter().enumerate() {
        let (size, font) = if i == 0 {
            (profile.subject_size, &canvas.font_bold)
        } else {
            (profile.detail_size, &canvas.font_regular)
        };
        let text = fit_text(line, size, width - 2.0);
        centered_text(layer, &text, size, center_x, line_y, font);
        line_y -= profile.line_height;
    }

    if cell.row_span > 1 {
        let label = format::duration_label(hours);
        let label_x = x + width - text_width_mm(&label, TINY_FONT_SIZE) - 1.2;
        layer.use_text(
            label,
            TINY_FONT_SIZE,
            Mm(label_x),
            Mm(top - height + 1.5),
            &canvas.font_regular,
        );
    }
}

// ============================================================================
// Course Summary
// ============================================================================

fn summary_columns() -> [(f32, f32); 3] {
    let title_width = content_width() - UNITS_COL_WIDTH_MM - CODE_COL_WIDTH_MM;
    [
        (MARGIN_MM, UNITS_COL_WIDTH_MM),
        (MARGIN_MM + UNITS_COL_WIDTH_MM, CODE_COL_WIDTH_MM),
        (MARGIN_MM + UNITS_COL_WIDTH_MM + CODE_COL_WIDTH_MM, title_width),
    ]
}

fn draw_course_summary(canvas: &mut Canvas, section: &SectionTimetable<'_>) {
    let columns = summary_columns();
    let title_width = columns[2].1 - 4.0;

    let first_row_height = section
        .summary
        .first()
        .map(|entry| summary_row_height(&entry.descriptive_title, title_width))
        .unwrap_or(SUMMARY_HEADER_HEIGHT_MM);
    if !canvas.fits(SUMMARY_TITLE_HEIGHT_MM + SUMMARY_HEADER_HEIGHT_MM + first_row_height) {
        canvas.start_page();
    }

    canvas.layer.use_text(
        "Summary of Courses",
        HEADER_FONT_SIZE,
        Mm(MARGIN_MM),
        Mm(canvas.y - 5.0),
        &canvas.font_bold,
    );
    canvas.y -= SUMMARY_TITLE_HEIGHT_MM;
    draw_summary_header(canvas);

    for (i, entry) in section.summary.iter().enumerate() {
        let lines = wrap_text(&entry.descriptive_title, NORMAL_FONT_SIZE, title_width);
        let row_height = summary_row_height(&entry.descriptive_title, title_width);
        if !canvas.fits(row_height) {
            debug!(entry = i, "course summary continues on next page");
            canvas.start_page();
            draw_summary_header(canvas);
        }

        let top = canvas.y;
        let layer = &canvas.layer;
        if i % 2 == 1 {
            fill_rect(layer, MARGIN_MM, top, content_width(), row_height, STRIPE_FILL);
        }
        set_stroke(layer, (0.6, 0.6, 0.6), 0.3);
        for (x, w) in columns {
            stroke_rect(layer, x, top, w, row_height);
        }

        let first_y = top - SUMMARY_LINE_HEIGHT_MM;
        centered_text(
            layer,
            &entry.units.to_string(),
            NORMAL_FONT_SIZE,
            columns[0].0 + columns[0].1 / 2.0,
            first_y,
            &canvas.font_regular,
        );
        layer.use_text(
            fit_text(&entry.course_code, NORMAL_FONT_SIZE, columns[1].1 - 4.0),
            NORMAL_FONT_SIZE,
            Mm(columns[1].0 + 2.0),
            Mm(first_y),
            &canvas.font_regular,
        );
        let mut line_y = first_y;
        for line in &lines {
            layer.use_text(
                line.as_str(),
                NORMAL_FONT_SIZE,
                Mm(columns[2].0 + 2.0),
                Mm(line_y),
                &canvas.font_regular,
            );
            line_y -= SUMMARY_LINE_HEIGHT_MM;
        }

        canvas.y -= row_height;
    }

    // Total units
    let row_height = SUMMARY_HEADER_HEIGHT_MM;
    if !canvas.fits(row_height) {
        canvas.start_page();
        draw_summary_header(canvas);
    }
    let top = canvas.y;
    let layer = &canvas.layer;
    set_stroke(layer, (0.3, 0.3, 0.3), 0.4);
    stroke_rect(layer, MARGIN_MM, top, content_width(), row_height);
    let text_y = top - row_height / 2.0 - 1.2;
    centered_text(
        layer,
        &section.total_units().to_string(),
        NORMAL_FONT_SIZE,
        columns[0].0 + columns[0].1 / 2.0,
        text_y,
        &canvas.font_bold,
    );
    layer.use_text(
        "TOTAL UNITS",
        NORMAL_FONT_SIZE,
        Mm(columns[1].0 + 2.0),
        Mm(text_y),
        &canvas.font_bold,
    );
    canvas.y -= row_height;
}

fn summary_row_height(title: &str, title_width: f32) -> f32 {
    let lines = wrap_text(title, NORMAL_FONT_SIZE, title_width).len().max(1);
    lines as f32 * SUMMARY_LINE_HEIGHT_MM + 2.4
}

fn draw_summary_header(canvas: &mut Canvas) {
    let top = canvas.y;
    let layer = &canvas.layer;
    let columns = summary_columns();

    fill_rect(layer, MARGIN_MM, top, content_width(), SUMMARY_HEADER_HEIGHT_MM, HEADER_FILL);
    set_stroke(layer, (0.3, 0.3, 0.3), 0.4);

    let text_y = top - SUMMARY_HEADER_HEIGHT_MM / 2.0 - 1.2;
    for ((x, w), label) in columns
        .iter()
        .zip(["UNITS", "SUBJECT CODE", "DESCRIPTIVE TITLE"])
    {
        stroke_rect(layer, *x, top, *w, SUMMARY_HEADER_HEIGHT_MM);
        layer.use_text(label, SMALL_FONT_SIZE, Mm(x + 2.0), Mm(text_y), &canvas.font_bold);
    }

    canvas.y -= SUMMARY_HEADER_HEIGHT_MM;
}

// ============================================================================
// Footer
// ============================================================================

/// Stamp every page once the page count is known.
fn draw_footers(canvas: &Canvas, ctx: &DocumentContext<'_>) {
    let total = canvas.pages.len();
    let right_edge = MARGIN_MM + content_width();

    for (i, (page, layer_idx)) in canvas.pages.iter().enumerate() {
        let layer = canvas.doc.get_page(*page).get_layer(*layer_idx);

        set_stroke(&layer, (0.6, 0.6, 0.6), 0.3);
        let rule_y = MARGIN_MM + FOOTER_HEIGHT_MM - 2.0;
        draw_line(&layer, MARGIN_MM, rule_y, right_edge, rule_y);

        match &ctx.brand.footer {
            Some(img) => {
                let (w, h) = fit_within(img, content_width() * 0.6, FOOTER_HEIGHT_MM - 4.0);
                embed_rgb(&layer, img, PAGE_WIDTH_MM / 2.0 - w / 2.0, MARGIN_MM, w);
                debug!(page = i + 1, height = h, "footer image placed");
            }
            None => centered_text(
                &layer,
                &ctx.branding.footer_text(),
                SMALL_FONT_SIZE,
                PAGE_WIDTH_MM / 2.0,
                MARGIN_MM + 5.0,
                &canvas.font_regular,
            ),
        }

        let page_label = format!("Page {} of {}", i + 1, total);
        layer.use_text(
            page_label.as_str(),
            TINY_FONT_SIZE,
            Mm(right_edge - text_width_mm(&page_label, TINY_FONT_SIZE)),
            Mm(MARGIN_MM),
            &canvas.font_regular,
        );
    }
}

// ============================================================================
// Text Utilities
// ============================================================================

/// Approximate rendered width of `text` in Helvetica.
pub fn text_width_mm(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * AVG_GLYPH_EM * PT_TO_MM
}

/// Shorten `text` with ".." until it fits `max_width`.
pub fn fit_text(text: &str, font_size: f32, max_width: f32) -> String {
    if text_width_mm(text, font_size) <= max_width {
        return text.to_string();
    }
    let mut chars: Vec<char> = text.chars().collect();
    while !chars.is_empty() {
        chars.pop();
        let candidate: String = chars.iter().collect::<String>() + "..";
        if text_width_mm(&candidate, font_size) <= max_width {
            return candidate;
        }
    }
    String::new()
}

/// Greedy word wrap; words longer than a line are split.
pub fn wrap_text(text: &str, font_size: f32, max_width: f32) -> Vec<String> {
    let max_chars = ((max_width / (font_size * AVG_GLYPH_EM * PT_TO_MM)) as usize).max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let word: String = word.into_iter().collect();
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn centered_text(
    layer: &PdfLayerReference,
    text: &str,
    font_size: f32,
    center_x: f32,
    y: f32,
    font: &IndirectFontRef,
) {
    let x = center_x - text_width_mm(text, font_size) / 2.0;
    layer.use_text(text, font_size, Mm(x), Mm(y), font);
}

// ============================================================================
// Drawing Utilities
// ============================================================================

fn rgb(color: (f32, f32, f32)) -> Color {
    Color::Rgb(Rgb::new(color.0, color.1, color.2, None))
}

fn set_stroke(layer: &PdfLayerReference, color: (f32, f32, f32), thickness: f32) {
    layer.set_outline_color(rgb(color));
    layer.set_outline_thickness(thickness);
}

fn draw_line(layer: &PdfLayerReference, x1: f32, y1: f32, x2: f32, y2: f32) {
    let points = vec![
        (Point::new(Mm(x1), Mm(y1)), false),
        (Point::new(Mm(x2), Mm(y2)), false),
    ];
    let line = Line {
        points,
        is_closed: false,
    };
    layer.add_line(line);
}

fn rect_points(x: f32, top: f32, width: f32, height: f32) -> Vec<(Point, bool)> {
    vec![
        (Point::new(Mm(x), Mm(top)), false),
        (Point::new(Mm(x + width), Mm(top)), false),
        (Point::new(Mm(x + width), Mm(top - height)), false),
        (Point::new(Mm(x), Mm(top - height)), false),
    ]
}

fn stroke_rect(layer: &PdfLayerReference, x: f32, top: f32, width: f32, height: f32) {
    layer.add_line(Line {
        points: rect_points(x, top, width, height),
        is_closed: true,
    });
}

/// Fill a rectangle hanging down from `top`, then restore black text.
fn fill_rect(
    layer: &PdfLayerReference,
    x: f32,
    top: f32,
    width: f32,
    height: f32,
    color: (f32, f32, f32),
) {
    layer.set_fill_color(rgb(color));
    layer.add_polygon(Polygon {
        rings: vec![rect_points(x, top, width, height)],
        mode: PaintMode::Fill,
        winding_order: WindingOrder::NonZero,
    });
    layer.set_fill_color(rgb((0.0, 0.0, 0.0)));
}

/// Size in mm that keeps the image's aspect ratio inside the box.
fn fit_within(img: &RgbImage, max_width_mm: f32, max_height_mm: f32) -> (f32, f32) {
    let (width_px, height_px) = img.dimensions();
    if width_px == 0 || height_px == 0 {
        return (0.0, 0.0);
    }
    let aspect_ratio = width_px as f32 / height_px as f32;
    if max_width_mm / max_height_mm > aspect_ratio {
        // Height-constrained
        (max_height_mm * aspect_ratio, max_height_mm)
    } else {
        // Width-constrained
        (max_width_mm, max_width_mm / aspect_ratio)
    }
}

/// Place an RGB image with its lower-left corner at (x, y), `width_mm` wide.
fn embed_rgb(layer: &PdfLayerReference, img: &RgbImage, x: f32, y: f32, width_mm: f32) {
    let (width_px, height_px) = img.dimensions();
    if width_px == 0 || height_px == 0 || width_mm <= 0.0 {
        return;
    }

    let image = Image::from(ImageXObject {
        width: Px(width_px as usize),
        height: Px(height_px as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: img.as_raw().clone(),
        image_filter: None,
        clipping_bbox: None,
        smask: None,
    });

    // DPI = pixels / (mm / 25.4)
    let dpi = width_px as f32 / (width_mm / 25.4);

    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x)),
            translate_y: Some(Mm(y)),
            dpi: Some(dpi),
            ..Default::default()
        },
    );
}
