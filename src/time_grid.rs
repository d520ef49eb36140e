// Fixed hourly slots and weekdays the timetable is laid out on.

use std::fmt;

// ============================================================================
// Time Slots
// ============================================================================

/// One hourly row of the timetable. Times are minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    pub start: u32,
    pub end: u32,
    pub label: Option<&'static str>,
}

impl TimeSlot {
    const fn hour(h: u32) -> Self {
        TimeSlot {
            start: h * 60,
            end: (h + 1) * 60,
            label: None,
        }
    }

    const fn labeled(h: u32, label: &'static str) -> Self {
        TimeSlot {
            start: h * 60,
            end: (h + 1) * 60,
            label: Some(label),
        }
    }

    /// Row label for the time column, e.g. "9:00-10:00" or "LUNCH".
    pub fn display_label(&self) -> String {
        match self.label {
            Some(label) => label.to_string(),
            None => format!("{}-{}", clock_12h(self.start), clock_12h(self.end)),
        }
    }
}

/// 07:00 to 17:00, one slot per hour, noon labeled as lunch.
pub const TIME_SLOTS: [TimeSlot; 10] = [
    TimeSlot::hour(7),
    TimeSlot::hour(8),
    TimeSlot::hour(9),
    TimeSlot::hour(10),
    TimeSlot::hour(11),
    TimeSlot::labeled(12, "LUNCH"),
    TimeSlot::hour(13),
    TimeSlot::hour(14),
    TimeSlot::hour(15),
    TimeSlot::hour(16),
];

/// Index of the slot containing `minutes`. The end of the last slot is
/// exclusive, so 17:00 itself has no slot.
pub fn slot_index_for(minutes: u32) -> Option<usize> {
    TIME_SLOTS
        .iter()
        .position(|slot| slot.start <= minutes && minutes < slot.end)
}

// ============================================================================
// Weekdays
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

pub const WEEKDAYS: [Weekday; 6] = [
    Weekday::Monday,
    Weekday::Tuesday,
    Weekday::Wednesday,
    Weekday::Thursday,
    Weekday::Friday,
    Weekday::Saturday,
];

/// Sort rank for names that are not one of the six weekdays.
pub const UNKNOWN_DAY_RANK: u8 = 7;

impl Weekday {
    pub fn parse(name: &str) -> Option<Weekday> {
        let name = name.trim();
        WEEKDAYS
            .iter()
            .copied()
            .find(|day| day.name().eq_ignore_ascii_case(name))
    }

    pub fn name(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
        }
    }

    /// Monday = 1 ... Saturday = 6.
    pub fn rank(self) -> u8 {
        self.column() as u8 + 1
    }

    /// Grid column of this day.
    pub fn column(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rank of a raw day name; unrecognized names sort after Saturday.
pub fn day_rank(name: &str) -> u8 {
    Weekday::parse(name).map_or(UNKNOWN_DAY_RANK, Weekday::rank)
}

// ============================================================================
// Clock Conversion
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Meridiem {
    Am,
    Pm,
}

impl Meridiem {
    pub fn parse(tag: &str) -> Option<Meridiem> {
        match tag.trim().to_ascii_uppercase().as_str() {
            "AM" | "A.M." => Some(Meridiem::Am),
            "PM" | "P.M." => Some(Meridiem::Pm),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Meridiem::Am => "AM",
            Meridiem::Pm => "PM",
        }
    }
}

/// Split "9:00", "9:00 PM" or "9:00PM" into hour, minute and optional tag.
fn parse_clock(clock: &str) -> Option<(u32, u32, Option<Meridiem>)> {
    let clock = clock.trim();
    let upper = clock.to_ascii_uppercase();
    let (digits, inline) = match upper.strip_suffix("AM") {
        Some(rest) => (rest, Some(Meridiem::Am)),
        None => match upper.strip_suffix("PM") {
            Some(rest) => (rest, Some(Meridiem::Pm)),
            None => (upper.as_str(), None),
        },
    };

    let (h, m) = digits.trim().split_once(':')?;
    let hour: u32 = h.trim().parse().ok()?;
    let minute: u32 = m.trim().parse().ok()?;
    if minute > 59 {
        return None;
    }
    Some((hour, minute, inline))
}

/// Minutes since midnight on the 24-hour scale.
///
/// With a period, 12 AM is hour 0, 12 PM stays 12 and other PM hours add 12.
/// Without one the clock is read as 24-hour time.
pub fn to_minutes(clock: &str, period: Option<&str>) -> Option<u32> {
    let (hour, minute, inline) = parse_clock(clock)?;
    let period = period.and_then(Meridiem::parse).or(inline);

    let hour = match period {
        Some(_) if hour == 0 || hour > 12 => return None,
        Some(Meridiem::Am) if hour == 12 => 0,
        Some(Meridiem::Pm) if hour == 12 => 12,
        Some(Meridiem::Pm) => hour + 12,
        Some(Meridiem::Am) => hour,
        None if hour > 23 => return None,
        None => hour,
    };
    Some(hour * 60 + minute)
}

/// "H:MM" on a 12-hour dial without the period: 0 -> 12, 13 -> 1.
pub fn clock_12h(minutes: u32) -> String {
    let hour = (minutes / 60) % 24;
    let minute = minutes % 60;
    let display_hour = match hour {
        0 => 12,
        h if h > 12 => h - 12,
        h => h,
    };
    format!("{}:{:02}", display_hour, minute)
}

/// Period that belongs to a 24-hour minute count.
pub fn meridiem_of(minutes: u32) -> Meridiem {
    if (minutes / 60) % 24 < 12 {
        Meridiem::Am
    } else {
        Meridiem::Pm
    }
}
