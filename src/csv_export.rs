// CSV rendition of the timetable: same grid and summary, no pagination.

use chrono::NaiveDate;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use tracing::info;

use crate::config::Branding;
use crate::error::ExportError;
use crate::format::NOT_AVAILABLE;
use crate::model::UserInfo;
use crate::placement::{Diagnostics, GridCell};
use crate::section::SectionTimetable;
use crate::time_grid::{TIME_SLOTS, WEEKDAYS};

pub struct TabularContext<'a> {
    pub user: &'a UserInfo,
    pub branding: &'a Branding,
    pub export_date: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabularReport {
    pub sections: Vec<String>,
    pub diagnostics: Diagnostics,
}

pub struct RenderedTable {
    pub bytes: Vec<u8>,
    pub report: TabularReport,
}

/// Text of one grid cell: continuation and empty cells are blank, class
/// cells have their lines joined with "; ".
pub fn cell_field(cell: &GridCell<'_>) -> String {
    if cell.is_primary() {
        cell.content.lines().collect::<Vec<_>>().join("; ")
    } else {
        String::new()
    }
}

/// Rows accumulated as CSV text, with bare blank lines between blocks.
///
/// Fields are quoted only where needed, except class cells in the grid
/// which are always quoted.
struct CsvDocument {
    buf: Vec<u8>,
}

impl CsvDocument {
    fn block(&mut self, rows: &[Vec<String>]) -> Result<(), ExportError> {
        let mut wtr = WriterBuilder::new()
            .flexible(true)
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(&mut self.buf);
        for row in rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// One timetable row: slot label, then a field per weekday.
    fn grid_row(&mut self, label: &str, cells: &[String]) -> Result<(), ExportError> {
        self.field(label, QuoteStyle::Necessary)?;
        for cell in cells {
            self.buf.push(b',');
            let style = if cell.is_empty() {
                QuoteStyle::Never
            } else {
                QuoteStyle::Always
            };
            self.field(cell, style)?;
        }
        self.buf.push(b'\n');
        Ok(())
    }

    fn field(&mut self, text: &str, style: QuoteStyle) -> Result<(), ExportError> {
        let mut wtr = WriterBuilder::new()
            .quote_style(style)
            .from_writer(&mut self.buf);
        wtr.write_field(text)?;
        wtr.flush()?;
        Ok(())
    }

    /// csv cannot express a record with no fields.
    fn blank(&mut self) {
        self.buf.push(b'\n');
    }
}

fn row<S: ToString>(fields: &[S]) -> Vec<String> {
    fields.iter().map(ToString::to_string).collect()
}

/// Render every section as UTF-8 CSV held in memory.
pub fn render_table(
    sections: &[SectionTimetable<'_>],
    ctx: &TabularContext<'_>,
) -> Result<RenderedTable, ExportError> {
    if sections.is_empty() {
        return Err(ExportError::EmptySchedule);
    }

    let mut out = CsvDocument { buf: Vec::new() };
    let mut report = TabularReport::default();

    // Branding preamble
    out.block(&[
        row(&[&ctx.branding.institution_name]),
        row(&[&ctx.branding.campus_line]),
        row(&[&ctx.branding.product_name]),
    ])?;
    out.blank();

    for section in sections {
        write_section(&mut out, section, ctx)?;
        report.sections.push(section.details.section_name.clone());
        report.diagnostics.extend(section.diagnostics.clone());
    }

    out.block(&[vec![format!(
        "Generated by {} on {}",
        ctx.branding.product_name,
        ctx.export_date.format("%Y-%m-%d")
    )]])?;

    info!(sections = report.sections.len(), bytes = out.buf.len(), "table rendered");
    Ok(RenderedTable {
        bytes: out.buf,
        report,
    })
}

fn write_section(
    out: &mut CsvDocument,
    section: &SectionTimetable<'_>,
    ctx: &TabularContext<'_>,
) -> Result<(), ExportError> {
    let details = &section.details;
    let name = ctx
        .user
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(NOT_AVAILABLE);

    // Info lines
    out.block(&[
        row(&["Name", name]),
        row(&["Section", details.section_name.as_str()]),
        row(&["Adviser", details.adviser_name.as_str()]),
        row(&["Shift", details.shift.as_str()]),
        row(&[
            "Date Exported".to_string(),
            ctx.export_date.format("%Y-%m-%d").to_string(),
        ]),
        row(&["Total Classes".to_string(), section.total_classes().to_string()]),
    ])?;
    out.blank();

    // Timetable
    let mut header = vec!["TIME".to_string()];
    header.extend(WEEKDAYS.iter().map(|day| day.name().to_string()));
    out.block(&[header])?;
    for (index, slot) in TIME_SLOTS.iter().enumerate() {
        let cells: Vec<String> = section.grid.row(index).iter().map(cell_field).collect();
        out.grid_row(&slot.display_label(), &cells)?;
    }
    out.blank();

    // Course summary
    let mut rows = vec![row(&["UNITS", "SUBJECT CODE", "DESCRIPTIVE TITLE"])];
    for entry in &section.summary {
        rows.push(vec![
            entry.units.to_string(),
            entry.course_code.clone(),
            entry.descriptive_title.clone(),
        ]);
    }
    rows.push(vec![
        section.total_units().to_string(),
        "TOTAL UNITS".to_string(),
        String::new(),
    ]);
    out.block(&rows)?;
    out.blank();

    Ok(())
}
