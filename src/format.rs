// Human-readable text for grid cells, the course summary and section info.

use std::collections::HashSet;

use crate::model::{Ref, ScheduleRecord, ScheduleType};
use crate::time_grid::{clock_12h, meridiem_of, to_minutes, Meridiem};

/// Placeholder for missing teacher or room.
pub const TBA: &str = "TBA";

/// Placeholder for missing section details.
pub const NOT_AVAILABLE: &str = "N/A";

/// Units assumed for subjects that do not state them.
pub const DEFAULT_UNITS: u32 = 3;

// ============================================================================
// Cell Text
// ============================================================================

/// Subject code with " L" appended for lab meetings.
pub fn subject_line(record: &ScheduleRecord) -> String {
    let code = record
        .subject()
        .and_then(|s| s.course_code.as_deref())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(TBA);
    match record.schedule_type {
        ScheduleType::Lab => format!("{} L", code),
        ScheduleType::Lecture => code.to_string(),
    }
}

fn clock_with_period(clock: &str, period: Option<&str>) -> String {
    if let Some(tag) = period.and_then(Meridiem::parse) {
        return format!("{} {}", clock.trim(), tag.as_str());
    }
    match to_minutes(clock, None) {
        Some(minutes) => format!("{} {}", clock_12h(minutes), meridiem_of(minutes).as_str()),
        None => clock.trim().to_string(),
    }
}

/// "9:00 AM - 11:00 AM". Sides without a period are converted from 24-hour
/// time.
pub fn time_range(record: &ScheduleRecord) -> String {
    format!(
        "{} - {}",
        clock_with_period(&record.start_time, record.start_period.as_deref()),
        clock_with_period(&record.end_time, record.end_period.as_deref()),
    )
}

pub fn teacher_line(record: &ScheduleRecord) -> String {
    record
        .teacher()
        .and_then(|t| t.fullname.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(TBA)
        .to_string()
}

pub fn room_line(record: &ScheduleRecord) -> String {
    record
        .room()
        .and_then(|r| r.room_name.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(TBA)
        .to_string()
}

/// The four cell lines: subject, time range, instructor, room.
pub fn cell_lines(record: &ScheduleRecord) -> [String; 4] {
    [
        subject_line(record),
        time_range(record),
        teacher_line(record),
        room_line(record),
    ]
}

pub fn cell_text(record: &ScheduleRecord) -> String {
    cell_lines(record).join("\n")
}

// ============================================================================
// Duration & Typography
// ============================================================================

/// Length of the meeting in hours; zero when either time is unreadable.
pub fn duration_hours(record: &ScheduleRecord) -> f32 {
    match (record.start_minutes(), record.end_minutes()) {
        (Some(start), Some(end)) => (end as f32 - start as f32) / 60.0,
        _ => 0.0,
    }
}

/// Font sizes (points) and line spacing (mm) for a grid cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontProfile {
    pub subject_size: f32,
    pub detail_size: f32,
    pub line_height: f32,
}

const SHORT_CLASS: FontProfile = FontProfile {
    subject_size: 7.0,
    detail_size: 5.5,
    line_height: 2.6,
};

const MEDIUM_CLASS: FontProfile = FontProfile {
    subject_size: 8.0,
    detail_size: 6.5,
    line_height: 3.2,
};

const LONG_CLASS: FontProfile = FontProfile {
    subject_size: 9.0,
    detail_size: 7.5,
    line_height: 3.8,
};

/// Larger blocks get larger type: up to 1h, up to 2h, longer.
pub fn font_profile(hours: f32) -> FontProfile {
    if hours <= 1.0 {
        SHORT_CLASS
    } else if hours <= 2.0 {
        MEDIUM_CLASS
    } else {
        LONG_CLASS
    }
}

/// "2h", "1.5h".
pub fn duration_label(hours: f32) -> String {
    if (hours - hours.round()).abs() < f32::EPSILON {
        format!("{}h", hours.round() as i64)
    } else {
        format!("{:.1}h", hours)
    }
}

// ============================================================================
// Course Summary
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectSummaryEntry {
    pub units: u32,
    pub course_code: String,
    pub descriptive_title: String,
}

/// Distinct subjects in first-seen order. Unresolved subject references
/// carry nothing to print and are left out.
pub fn subjects_summary<'a, I>(records: I) -> Vec<SubjectSummaryEntry>
where
    I: IntoIterator<Item = &'a ScheduleRecord>,
{
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for record in records {
        let Some(subject) = record.subject() else {
            continue;
        };
        let code = subject.course_code.as_deref().unwrap_or("").trim();
        let identity = subject
            .id
            .clone()
            .unwrap_or_else(|| format!("code:{}", code));
        if !seen.insert(identity) {
            continue;
        }

        entries.push(SubjectSummaryEntry {
            units: subject.units.unwrap_or(DEFAULT_UNITS),
            course_code: if code.is_empty() { TBA.to_string() } else { code.to_string() },
            descriptive_title: subject
                .descriptive_title
                .as_deref()
                .map(str::trim)
                .unwrap_or("")
                .to_string(),
        });
    }

    entries
}

pub fn total_units(summary: &[SubjectSummaryEntry]) -> u32 {
    summary.iter().map(|entry| entry.units).sum()
}

// ============================================================================
// Section Details
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionDetails {
    pub section_name: String,
    pub adviser_name: String,
    pub shift: String,
}

impl Default for SectionDetails {
    fn default() -> Self {
        SectionDetails {
            section_name: NOT_AVAILABLE.to_string(),
            adviser_name: NOT_AVAILABLE.to_string(),
            shift: NOT_AVAILABLE.to_string(),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Section name, adviser and shift from the first record's section.
///
/// The adviser is looked up among the batch's teachers by id; failing that
/// the stored adviser value itself is shown.
pub fn section_details<'a, I>(records: I) -> SectionDetails
where
    I: IntoIterator<Item = &'a ScheduleRecord>,
{
    let records: Vec<&ScheduleRecord> = records.into_iter().collect();
    let Some(section) = records.first().and_then(|r| r.section()) else {
        return SectionDetails::default();
    };

    let (adviser_id, stored_name) = match &section.adviser_teacher {
        Some(Ref::Resolved(teacher)) => (
            teacher.id.clone(),
            non_empty(teacher.fullname.as_deref()).or_else(|| teacher.id.clone()),
        ),
        Some(Ref::Reference(id)) => (Some(id.clone()), non_empty(Some(id.as_str()))),
        None => (None, None),
    };

    let matched = adviser_id.as_deref().and_then(|id| {
        records
            .iter()
            .filter_map(|r| r.teacher())
            .find(|t| t.id.as_deref() == Some(id))
            .and_then(|t| non_empty(t.fullname.as_deref()))
    });

    SectionDetails {
        section_name: non_empty(section.section_name.as_deref())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        adviser_name: matched
            .or(stored_name)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        shift: non_empty(section.shift.as_deref()).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    }
}
