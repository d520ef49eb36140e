// Schedule records as handed over by the persistence layer.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::time_grid::{self, Weekday};

// ============================================================================
// References
// ============================================================================

/// A related document that is either embedded or only known by its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ref<T> {
    Resolved(T),
    Reference(String),
}

impl<T> Ref<T> {
    /// The embedded document, if this reference was resolved.
    pub fn resolved(&self) -> Option<&T> {
        match self {
            Ref::Resolved(value) => Some(value),
            Ref::Reference(_) => None,
        }
    }
}

fn resolved<T>(value: &Option<Ref<T>>) -> Option<&T> {
    value.as_ref().and_then(Ref::resolved)
}

// ============================================================================
// Related Documents
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub course_code: Option<String>,
    #[serde(default)]
    pub descriptive_title: Option<String>,
    #[serde(default, deserialize_with = "units_from_number_or_text")]
    pub units: Option<u32>,
}

/// Units as stored: a number, or numeric text such as "3".
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredUnits {
    Whole(u32),
    Decimal(f64),
    Text(String),
}

/// Unreadable units become `None` so the default credit applies instead of
/// rejecting the whole record.
fn units_from_number_or_text<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let stored = Option::<StoredUnits>::deserialize(deserializer)?;
    Ok(stored.and_then(|units| match units {
        StoredUnits::Whole(n) => Some(n),
        StoredUnits::Decimal(n) if n.is_finite() && n >= 0.0 && n.fract() == 0.0 => Some(n as u32),
        StoredUnits::Decimal(_) => None,
        StoredUnits::Text(text) => text.trim().parse().ok(),
    }))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub fullname: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub room_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub section_name: Option<String>,
    #[serde(default)]
    pub adviser_teacher: Option<Ref<Teacher>>,
    #[serde(default)]
    pub shift: Option<String>,
    #[serde(default)]
    pub year_level: Option<YearLevel>,
}

/// Year level as stored: either a number or text such as "3rd Year".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum YearLevel {
    Number(u32),
    Text(String),
}

impl YearLevel {
    /// Numeric rank used for ordering sections; text without leading digits
    /// ranks last.
    pub fn rank(&self) -> u32 {
        match self {
            YearLevel::Number(n) => *n,
            YearLevel::Text(text) => {
                let digits: String = text
                    .trim()
                    .chars()
                    .take_while(|c| c.is_ascii_digit())
                    .collect();
                digits.parse().unwrap_or(u32::MAX)
            }
        }
    }
}

impl fmt::Display for YearLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearLevel::Number(n) => write!(f, "{}", n),
            YearLevel::Text(text) => f.write_str(text),
        }
    }
}

// ============================================================================
// Schedule Records
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ScheduleType {
    #[default]
    Lecture,
    Lab,
}

impl From<String> for ScheduleType {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "lab" | "laboratory" => ScheduleType::Lab,
            _ => ScheduleType::Lecture,
        }
    }
}

impl From<ScheduleType> for String {
    fn from(kind: ScheduleType) -> Self {
        match kind {
            ScheduleType::Lecture => "lecture".to_string(),
            ScheduleType::Lab => "lab".to_string(),
        }
    }
}

/// One class meeting. Read-only input to every export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRecord {
    pub day: String,
    pub start_time: String,
    #[serde(default)]
    pub start_period: Option<String>,
    pub end_time: String,
    #[serde(default)]
    pub end_period: Option<String>,
    #[serde(default)]
    pub schedule_type: ScheduleType,
    #[serde(default)]
    pub subject: Option<Ref<Subject>>,
    #[serde(default)]
    pub teacher: Option<Ref<Teacher>>,
    #[serde(default)]
    pub room: Option<Ref<Room>>,
    #[serde(default)]
    pub section: Option<Ref<Section>>,
}

impl ScheduleRecord {
    pub fn weekday(&self) -> Option<Weekday> {
        Weekday::parse(&self.day)
    }

    pub fn start_minutes(&self) -> Option<u32> {
        time_grid::to_minutes(&self.start_time, self.start_period.as_deref())
    }

    pub fn end_minutes(&self) -> Option<u32> {
        time_grid::to_minutes(&self.end_time, self.end_period.as_deref())
    }

    pub fn subject(&self) -> Option<&Subject> {
        resolved(&self.subject)
    }

    pub fn teacher(&self) -> Option<&Teacher> {
        resolved(&self.teacher)
    }

    pub fn room(&self) -> Option<&Room> {
        resolved(&self.room)
    }

    pub fn section(&self) -> Option<&Section> {
        resolved(&self.section)
    }

    /// Short human description used in diagnostics.
    pub fn describe(&self) -> String {
        let code = self
            .subject()
            .and_then(|s| s.course_code.as_deref())
            .unwrap_or("TBA");
        format!(
            "{} {} {} {}-{} {}",
            code.trim(),
            self.day,
            self.start_time,
            self.start_period.as_deref().unwrap_or(""),
            self.end_time,
            self.end_period.as_deref().unwrap_or(""),
        )
        .trim_end()
        .to_string()
    }
}

/// The exporting user, shown in the info box.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
}
