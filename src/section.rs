// Splits an export batch into per-section timetables ready to render.

use std::collections::HashMap;

use tracing::debug;

use crate::error::ExportError;
use crate::format::{self, SectionDetails, SubjectSummaryEntry};
use crate::model::{Ref, ScheduleRecord};
use crate::placement::{self, Diagnostics, TimetableGrid};

/// Everything one page layout needs for a single section.
#[derive(Debug, Clone)]
pub struct SectionTimetable<'a> {
    pub details: SectionDetails,
    pub records: Vec<&'a ScheduleRecord>,
    pub grid: TimetableGrid<'a>,
    pub summary: Vec<SubjectSummaryEntry>,
    pub diagnostics: Diagnostics,
}

impl<'a> SectionTimetable<'a> {
    pub fn build(records: Vec<&'a ScheduleRecord>) -> Self {
        let placement = placement::build_grid(records.iter().copied());
        SectionTimetable {
            details: format::section_details(records.iter().copied()),
            summary: format::subjects_summary(records.iter().copied()),
            grid: placement.grid,
            diagnostics: placement.diagnostics,
            records,
        }
    }

    pub fn total_classes(&self) -> usize {
        self.records.len()
    }

    pub fn total_units(&self) -> u32 {
        format::total_units(&self.summary)
    }
}

fn section_key(record: &ScheduleRecord) -> String {
    match &record.section {
        Some(Ref::Resolved(section)) => section
            .id
            .clone()
            .or_else(|| section.section_name.clone())
            .unwrap_or_default(),
        Some(Ref::Reference(id)) => id.clone(),
        None => String::new(),
    }
}

fn sort_key(records: &[&ScheduleRecord]) -> (u32, String) {
    let section = records.first().and_then(|r| r.section());
    let year = section
        .and_then(|s| s.year_level.as_ref())
        .map_or(u32::MAX, |y| y.rank());
    let name = section
        .and_then(|s| s.section_name.clone())
        .unwrap_or_else(|| format::NOT_AVAILABLE.to_string());
    (year, name)
}

/// Prepare the timetables of an export batch.
///
/// A single-section export puts every record on one timetable. A
/// multi-section export groups records by section and orders the groups by
/// year level, then section name.
pub fn prepare_sections(
    records: &[ScheduleRecord],
    multi_section: bool,
) -> Result<Vec<SectionTimetable<'_>>, ExportError> {
    if records.is_empty() {
        return Err(ExportError::EmptySchedule);
    }

    if !multi_section {
        return Ok(vec![SectionTimetable::build(records.iter().collect())]);
    }

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<&ScheduleRecord>> = HashMap::new();
    for record in records {
        let key = section_key(record);
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(record);
    }

    let mut grouped: Vec<Vec<&ScheduleRecord>> = order
        .into_iter()
        .filter_map(|key| groups.remove(&key))
        .collect();
    grouped.sort_by_cached_key(|group| sort_key(group));

    debug!(sections = grouped.len(), "grouped schedules by section");
    Ok(grouped.into_iter().map(SectionTimetable::build).collect())
}
