#![allow(dead_code)]

use timetable_export::model::{Ref, Room, ScheduleRecord, ScheduleType, Section, Subject, Teacher, YearLevel};

pub fn record(day: &str, start: &str, start_period: &str, end: &str, end_period: &str, code: &str) -> ScheduleRecord {
    ScheduleRecord {
        day: day.to_string(),
        start_time: start.to_string(),
        start_period: Some(start_period.to_string()),
        end_time: end.to_string(),
        end_period: Some(end_period.to_string()),
        schedule_type: ScheduleType::Lecture,
        subject: Some(Ref::Resolved(Subject {
            id: Some(format!("sub-{}", code)),
            course_code: Some(code.to_string()),
            descriptive_title: Some(format!("{} Title", code)),
            units: None,
        })),
        teacher: Some(Ref::Resolved(Teacher {
            id: Some("t-juan".to_string()),
            fullname: Some("Juan Dela Cruz".to_string()),
        })),
        room: Some(Ref::Resolved(Room {
            id: Some("r-cl1".to_string()),
            room_name: Some("CL1".to_string()),
        })),
        section: None,
    }
}

/// A record on the 24-hour clock, no periods.
pub fn record_24h(day: &str, start: &str, end: &str, code: &str) -> ScheduleRecord {
    ScheduleRecord {
        start_period: None,
        end_period: None,
        start_time: start.to_string(),
        end_time: end.to_string(),
        ..record(day, "7:00", "AM", "8:00", "AM", code)
    }
}

pub fn in_section(mut rec: ScheduleRecord, name: &str, year: u32) -> ScheduleRecord {
    rec.section = Some(Ref::Resolved(Section {
        id: Some(format!("sec-{}", name)),
        section_name: Some(name.to_string()),
        adviser_teacher: Some(Ref::Reference("t-juan".to_string())),
        shift: Some("Morning".to_string()),
        year_level: Some(YearLevel::Number(year)),
    }));
    rec
}
