// Export entry points and the interactive format prompt.

use chrono::NaiveDate;
use std::fmt;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::assets::AssetCache;
use crate::config::Branding;
use crate::csv_export::{self, TabularContext};
use crate::error::ExportError;
use crate::model::{ScheduleRecord, UserInfo};
use crate::pdf::{self, DocumentContext};
use crate::placement::Diagnostics;
use crate::section::{self, SectionTimetable};

// ============================================================================
// Requests & Outcomes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Pdf,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension().to_uppercase())
    }
}

/// What to export, supplied by the caller for each call.
#[derive(Debug, Clone)]
pub struct ExportRequest<'a> {
    pub records: &'a [ScheduleRecord],
    pub user: &'a UserInfo,
    pub multi_section: bool,
    pub export_date: NaiveDate,
    /// Filename stem; derived from the section when absent
    pub base_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    pub format: ExportFormat,
    pub path: PathBuf,
    /// Section names in output order
    pub sections: Vec<String>,
    /// Page count, for PDF output
    pub pages: Option<usize>,
    pub diagnostics: Diagnostics,
}

// ============================================================================
// Filenames
// ============================================================================

fn sanitize(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

/// Stem used when the caller does not name the file.
pub fn default_base_name(sections: &[SectionTimetable<'_>], multi_section: bool) -> String {
    if multi_section {
        return "all_sections_schedule".to_string();
    }
    let section = sections
        .first()
        .map(|s| sanitize(&s.details.section_name))
        .filter(|s| !s.is_empty() && s != "na");
    match section {
        Some(name) => format!("{}_schedule", name),
        None => "class_schedule".to_string(),
    }
}

/// `{base}_{YYYY-MM-DD}.{ext}`
pub fn export_file_name(base: &str, date: NaiveDate, format: ExportFormat) -> String {
    format!("{}_{}.{}", base, date.format("%Y-%m-%d"), format.extension())
}

// ============================================================================
// Exporter
// ============================================================================

/// Turns a request into a saved file. Holds no per-export state; the only
/// thing shared between calls is the injected asset cache.
pub struct Exporter<'c> {
    branding: &'c Branding,
    cache: &'c AssetCache,
    output_dir: PathBuf,
}

impl<'c> Exporter<'c> {
    pub fn new(branding: &'c Branding, cache: &'c AssetCache, output_dir: impl Into<PathBuf>) -> Self {
        Exporter {
            branding,
            cache,
            output_dir: output_dir.into(),
        }
    }

    pub fn export(
        &self,
        format: ExportFormat,
        request: &ExportRequest<'_>,
    ) -> Result<ExportOutcome, ExportError> {
        match format {
            ExportFormat::Pdf => self.export_document(request),
            ExportFormat::Csv => self.export_tabular(request),
        }
    }

    /// Render the paginated PDF and save it.
    pub fn export_document(&self, request: &ExportRequest<'_>) -> Result<ExportOutcome, ExportError> {
        let sections = section::prepare_sections(request.records, request.multi_section)?;
        let (brand, avatar) = self
            .cache
            .load_with_avatar(request.user.profile_picture.as_deref());

        let ctx = DocumentContext {
            user: request.user,
            branding: self.branding,
            brand,
            avatar: avatar.as_ref(),
            export_date: request.export_date,
        };
        let rendered = pdf::render_document(&sections, &ctx)?;

        let path = self.save(request, &sections, ExportFormat::Pdf, &rendered.bytes)?;
        Ok(ExportOutcome {
            format: ExportFormat::Pdf,
            path,
            sections: rendered
                .report
                .sections
                .into_iter()
                .map(|s| s.section_name)
                .collect(),
            pages: Some(rendered.report.pages),
            diagnostics: rendered.report.diagnostics,
        })
    }

    /// Render the CSV and save it.
    pub fn export_tabular(&self, request: &ExportRequest<'_>) -> Result<ExportOutcome, ExportError> {
        let sections = section::prepare_sections(request.records, request.multi_section)?;
        let ctx = TabularContext {
            user: request.user,
            branding: self.branding,
            export_date: request.export_date,
        };
        let rendered = csv_export::render_table(&sections, &ctx)?;

        let path = self.save(request, &sections, ExportFormat::Csv, &rendered.bytes)?;
        Ok(ExportOutcome {
            format: ExportFormat::Csv,
            path,
            sections: rendered.report.sections,
            pages: None,
            diagnostics: rendered.report.diagnostics,
        })
    }

    /// Write the finished artifact; nothing touches disk before this.
    fn save(
        &self,
        request: &ExportRequest<'_>,
        sections: &[SectionTimetable<'_>],
        format: ExportFormat,
        bytes: &[u8],
    ) -> Result<PathBuf, ExportError> {
        let base = request
            .base_name
            .clone()
            .unwrap_or_else(|| default_base_name(sections, request.multi_section));
        let path = self
            .output_dir
            .join(export_file_name(&base, request.export_date, format));

        std::fs::create_dir_all(&self.output_dir)?;
        std::fs::write(&path, bytes)?;
        info!(path = %path.display(), format = %format, "export saved");
        Ok(path)
    }
}

// ============================================================================
// Interactive Prompt
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportChoice {
    Pdf,
    Csv,
    Cancelled,
}

impl ExportChoice {
    /// Parse one answer; `None` means ask again.
    pub fn parse(answer: &str) -> Option<ExportChoice> {
        match answer.trim().to_ascii_lowercase().as_str() {
            "1" | "p" | "pdf" => Some(ExportChoice::Pdf),
            "2" | "c" | "csv" => Some(ExportChoice::Csv),
            "" | "q" | "quit" | "cancel" => Some(ExportChoice::Cancelled),
            _ => None,
        }
    }
}

/// `Open` accepts a choice, `Busy` while an export runs, `Closed` once
/// finished or cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptState {
    Open,
    Busy(ExportFormat),
    Closed,
}

pub struct ExportPrompt<R, W> {
    input: R,
    output: W,
    state: PromptState,
}

impl<R: BufRead, W: Write> ExportPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        ExportPrompt {
            input,
            output,
            state: PromptState::Open,
        }
    }

    pub fn state(&self) -> PromptState {
        self.state
    }

    /// Whether a choice can be made right now.
    pub fn control_enabled(&self) -> bool {
        self.state == PromptState::Open
    }

    /// Ask until a valid answer arrives. End of input cancels.
    pub fn choose(&mut self) -> io::Result<ExportChoice> {
        loop {
            write!(self.output, "Export timetable as [1] PDF, [2] CSV, [q] cancel: ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(ExportChoice::Cancelled);
            }
            match ExportChoice::parse(&line) {
                Some(choice) => return Ok(choice),
                None => writeln!(self.output, "Unrecognized choice: {}", line.trim())?,
            }
        }
    }

    /// Ask for a format and run the export. `Ok(None)` when cancelled.
    ///
    /// A failed export reopens the prompt and hands the error back.
    pub fn run(
        &mut self,
        exporter: &Exporter<'_>,
        request: &ExportRequest<'_>,
    ) -> Result<Option<ExportOutcome>, ExportError> {
        if self.state != PromptState::Open {
            return Ok(None);
        }

        let format = match self.choose()? {
            ExportChoice::Pdf => ExportFormat::Pdf,
            ExportChoice::Csv => ExportFormat::Csv,
            ExportChoice::Cancelled => {
                self.state = PromptState::Closed;
                return Ok(None);
            }
        };

        self.state = PromptState::Busy(format);
        match exporter.export(format, request) {
            Ok(outcome) => {
                self.state = PromptState::Closed;
                Ok(Some(outcome))
            }
            Err(e) => {
                warn!(%format, error = %e, "export failed");
                self.state = PromptState::Open;
                writeln!(self.output, "Export failed: {}", e)?;
                Err(e)
            }
        }
    }
}
