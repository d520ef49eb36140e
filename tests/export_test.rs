mod common;

use chrono::NaiveDate;
use common::{in_section, record};
use std::io::Cursor;
use timetable_export::config::BrandAssets;
use timetable_export::csv_export::{render_table, TabularContext};
use timetable_export::export::{default_base_name, export_file_name, PromptState};
use timetable_export::assets::BrandImages;
use timetable_export::model::{Ref, YearLevel};
use timetable_export::pdf::{render_document, DocumentContext, DocumentReport};
use timetable_export::section::prepare_sections;
use timetable_export::{
    AssetCache, Branding, ExportChoice, ExportError, ExportFormat, ExportPrompt, ExportRequest,
    Exporter, ScheduleRecord, UserInfo,
};

fn export_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
}

fn user() -> UserInfo {
    UserInfo {
        name: Some("Ana Lim".to_string()),
        profile_picture: None,
    }
}

fn request<'a>(records: &'a [ScheduleRecord], user: &'a UserInfo, multi: bool) -> ExportRequest<'a> {
    ExportRequest {
        records,
        user,
        multi_section: multi,
        export_date: export_date(),
        base_name: None,
    }
}

fn mixed_sections() -> Vec<ScheduleRecord> {
    vec![
        in_section(record("Monday", "9:00", "AM", "10:00", "AM", "C1"), "BSIT 3B", 3),
        in_section(record("Monday", "9:00", "AM", "10:00", "AM", "A1"), "BSIT 1A", 1),
        in_section(record("Tuesday", "9:00", "AM", "10:00", "AM", "C2"), "BSIT 3A", 3),
        in_section(record("Friday", "1:00", "PM", "3:00", "PM", "B1"), "BSIT 2A", 2),
        in_section(record("Wednesday", "9:00", "AM", "10:00", "AM", "A2"), "BSIT 1A", 1),
    ]
}

#[test]
fn test_sections_ordered_by_year_then_name() {
    let records = mixed_sections();
    let sections = prepare_sections(&records, true).unwrap();
    let names: Vec<&str> = sections.iter().map(|s| s.details.section_name.as_str()).collect();
    assert_eq!(names, ["BSIT 1A", "BSIT 2A", "BSIT 3A", "BSIT 3B"]);
    assert_eq!(sections[0].total_classes(), 2);

    let single = prepare_sections(&records, false).unwrap();
    assert_eq!(single.len(), 1);
    assert_eq!(single[0].total_classes(), 5);
}

#[test]
fn test_year_level_text_rank() {
    assert_eq!(YearLevel::Text("2nd Year".to_string()).rank(), 2);
    assert_eq!(YearLevel::Number(4).rank(), 4);
    assert_eq!(YearLevel::Text("Graduate".to_string()).rank(), u32::MAX);
}

#[test]
fn test_empty_schedule_rejected() {
    assert!(matches!(prepare_sections(&[], false), Err(ExportError::EmptySchedule)));

    let dir = tempfile::tempdir().unwrap();
    let branding = Branding::default();
    let cache = AssetCache::default();
    let exporter = Exporter::new(&branding, &cache, dir.path());
    let user = user();

    let result = exporter.export_document(&request(&[], &user, false));
    assert!(matches!(result, Err(ExportError::EmptySchedule)));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0, "no partial file left behind");
}

#[test]
fn test_csv_single_record_row() {
    let records = vec![record("Monday", "9:00", "AM", "11:00", "AM", "PC 317")];
    let sections = prepare_sections(&records, false).unwrap();
    let user = user();
    let branding = Branding::default();
    let ctx = TabularContext {
        user: &user,
        branding: &branding,
        export_date: export_date(),
    };

    let rendered = render_table(&sections, &ctx).unwrap();
    let text = String::from_utf8(rendered.bytes).unwrap();
    assert!(text.contains("\n9:00-10:00,\"PC 317; 9:00 AM - 11:00 AM; Juan Dela Cruz; CL1\",,,,,\n"));
    assert!(text.contains("\n10:00-11:00,,,,,,\n"));
    assert!(text.contains("\nTIME,Monday,Tuesday,Wednesday,Thursday,Friday,Saturday\n"));
    assert!(text.contains("\nUNITS,SUBJECT CODE,DESCRIPTIVE TITLE\n"));

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let rows: Vec<Vec<String>> = reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect();

    let header = rows.iter().position(|r| r.first().map(String::as_str) == Some("TIME")).unwrap();
    assert_eq!(rows[header][1..], ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday"]);

    let start = &rows[header + 3];
    assert_eq!(start[0], "9:00-10:00");
    assert_eq!(start[1], "PC 317; 9:00 AM - 11:00 AM; Juan Dela Cruz; CL1");
    assert!(start[2..].iter().all(String::is_empty));

    let follow_on = &rows[header + 4];
    assert_eq!(follow_on[0], "10:00-11:00");
    assert!(follow_on[1..].iter().all(String::is_empty));

    assert!(rows.iter().any(|r| r == &["UNITS", "SUBJECT CODE", "DESCRIPTIVE TITLE"]));
    assert!(rows.iter().any(|r| r == &["3", "PC 317", "PC 317 Title"]));
    assert!(rows.last().unwrap()[0].starts_with("Generated by Class Scheduling System"));
}

#[test]
fn test_pdf_export_orders_sections_one_page_each() {
    let dir = tempfile::tempdir().unwrap();
    let records = mixed_sections();
    let branding = Branding::default();
    let cache = AssetCache::default();
    let exporter = Exporter::new(&branding, &cache, dir.path());
    let user = user();

    let outcome = exporter.export_document(&request(&records, &user, true)).unwrap();
    assert_eq!(outcome.format, ExportFormat::Pdf);
    assert_eq!(outcome.sections, ["BSIT 1A", "BSIT 2A", "BSIT 3A", "BSIT 3B"]);
    assert_eq!(outcome.pages, Some(4));
    assert!(outcome.diagnostics.is_empty());
    assert_eq!(
        outcome.path,
        dir.path().join("all_sections_schedule_2026-10-17.pdf")
    );

    let bytes = std::fs::read(&outcome.path).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

/// One section whose course summary is far longer than a page.
fn long_course_list(section: &str, year: u32) -> Vec<ScheduleRecord> {
    (0..80)
        .map(|i| {
            let code = format!("EL {:03}", i);
            let mut rec = in_section(record("Monday", "7:00", "AM", "8:00", "AM", &code), section, year);
            if let Some(Ref::Resolved(subject)) = rec.subject.as_mut() {
                subject.descriptive_title = Some(format!(
                    "Special Topics in Distributed Systems, Applied Research Methods and Technical Writing, Part {}",
                    i
                ));
            }
            rec
        })
        .collect()
}

fn render_report(records: &[ScheduleRecord], multi: bool) -> DocumentReport {
    let sections = prepare_sections(records, multi).unwrap();
    let user = user();
    let branding = Branding::default();
    let brand = BrandImages::default();
    let ctx = DocumentContext {
        user: &user,
        branding: &branding,
        brand: &brand,
        avatar: None,
        export_date: export_date(),
    };
    render_document(&sections, &ctx).unwrap().report
}

#[test]
fn test_pdf_short_sections_start_on_consecutive_pages() {
    let report = render_report(&mixed_sections(), true);
    let first_pages: Vec<usize> = report.sections.iter().map(|s| s.first_page).collect();
    assert_eq!(first_pages, [1, 2, 3, 4]);
    assert_eq!(report.pages, 4);
}

#[test]
fn test_pdf_long_summary_continues_on_new_pages() {
    let records = long_course_list("BSIT 1A", 1);
    let report = render_report(&records, false);

    assert!(report.pages > 1, "80 wrapped summary rows must overflow one page");
    assert_eq!(report.sections.len(), 1);
    assert_eq!(report.sections[0].first_page, 1);
    // Every record shares one slot; only the first is placed
    assert_eq!(report.diagnostics.len(), 79);
}

#[test]
fn test_pdf_section_after_overflow_starts_on_fresh_page() {
    let long = long_course_list("BSIT 1A", 1);
    let long_pages = render_report(&long, false).pages;

    let mut records = long;
    records.push(in_section(
        record("Tuesday", "9:00", "AM", "10:00", "AM", "NET 1"),
        "BSIT 2A",
        2,
    ));
    let report = render_report(&records, true);

    let names: Vec<&str> = report.sections.iter().map(|s| s.section_name.as_str()).collect();
    assert_eq!(names, ["BSIT 1A", "BSIT 2A"]);
    assert_eq!(report.sections[0].first_page, 1);
    assert_eq!(report.sections[1].first_page, long_pages + 1);
    assert_eq!(report.pages, long_pages + 1);
}

#[test]
fn test_export_reports_dropped_records() {
    let dir = tempfile::tempdir().unwrap();
    let records = vec![
        record("Monday", "9:00", "AM", "11:00", "AM", "KEEP"),
        record("Monday", "10:00", "AM", "11:00", "AM", "CLASH"),
        record("Monday", "3:00", "PM", "5:00", "PM", "LATE"),
    ];
    let branding = Branding::default();
    let cache = AssetCache::default();
    let exporter = Exporter::new(&branding, &cache, dir.path());
    let user = user();

    let outcome = exporter.export_tabular(&request(&records, &user, false)).unwrap();
    assert_eq!(outcome.diagnostics.len(), 2);
    assert_eq!(outcome.path, dir.path().join("class_schedule_2026-10-17.csv"));
    let text = std::fs::read_to_string(&outcome.path).unwrap();
    assert!(text.contains("KEEP"));
    assert!(!text.contains("CLASH;"));
}

#[test]
fn test_asset_cache_loads_once() {
    let dir = tempfile::tempdir().unwrap();
    let records = vec![in_section(record("Monday", "9:00", "AM", "10:00", "AM", "A"), "BSIT 1A", 1)];
    let branding = Branding::default();
    let cache = AssetCache::new(BrandAssets {
        logos: vec!["does/not/exist.png".to_string()],
        footer: Some("file://does/not/exist-footer.png".to_string()),
    });
    let exporter = Exporter::new(&branding, &cache, dir.path());
    let user = UserInfo {
        name: None,
        profile_picture: Some("missing-avatar.jpg".to_string()),
    };

    assert!(!cache.is_loaded());
    let first = exporter.export_document(&request(&records, &user, false)).unwrap();
    let second = exporter.export_document(&request(&records, &user, false)).unwrap();
    assert_eq!(cache.load_count(), 1);
    assert_eq!(first.path, dir.path().join("bsit-1a_schedule_2026-10-17.pdf"));
    assert_eq!(first.path, second.path);
    assert!(cache.brand().logos[0].is_none());
}

#[test]
fn test_file_names() {
    assert_eq!(
        export_file_name("timetable", export_date(), ExportFormat::Csv),
        "timetable_2026-10-17.csv"
    );
    let records = vec![in_section(record("Monday", "9:00", "AM", "10:00", "AM", "A"), "BS CS 2-B", 2)];
    let sections = prepare_sections(&records, false).unwrap();
    assert_eq!(default_base_name(&sections, false), "bs-cs-2-b_schedule");
    assert_eq!(default_base_name(&sections, true), "all_sections_schedule");
}

#[test]
fn test_branding_partial_toml() {
    let branding = Branding::parse("institution_name = \"Northern State University\"\n").unwrap();
    assert_eq!(branding.institution_name, "Northern State University");
    assert_eq!(branding.product_name, Branding::default().product_name);
    assert!(branding.assets.logos.is_empty());

    let too_many = "[assets]\nlogos = [\"a\", \"b\", \"c\", \"d\"]\n";
    assert!(matches!(Branding::parse(too_many), Err(ExportError::Config(_))));
}

#[test]
fn test_prompt_choice_parsing() {
    assert_eq!(ExportChoice::parse("PDF\n"), Some(ExportChoice::Pdf));
    assert_eq!(ExportChoice::parse(" 2 "), Some(ExportChoice::Csv));
    assert_eq!(ExportChoice::parse("\n"), Some(ExportChoice::Cancelled));
    assert_eq!(ExportChoice::parse("xlsx"), None);
}

#[test]
fn test_prompt_runs_chosen_export() {
    let dir = tempfile::tempdir().unwrap();
    let records = vec![record("Monday", "9:00", "AM", "10:00", "AM", "A")];
    let branding = Branding::default();
    let cache = AssetCache::default();
    let exporter = Exporter::new(&branding, &cache, dir.path());
    let user = user();

    let mut output = Vec::new();
    let mut prompt = ExportPrompt::new(Cursor::new("xlsx\ncsv\n"), &mut output);
    let outcome = prompt.run(&exporter, &request(&records, &user, false)).unwrap();

    assert_eq!(outcome.unwrap().format, ExportFormat::Csv);
    assert_eq!(prompt.state(), PromptState::Closed);
    assert!(!prompt.control_enabled());
    drop(prompt);
    assert!(String::from_utf8(output).unwrap().contains("Unrecognized choice: xlsx"));
}

#[test]
fn test_prompt_cancel_and_end_of_input() {
    let dir = tempfile::tempdir().unwrap();
    let records = vec![record("Monday", "9:00", "AM", "10:00", "AM", "A")];
    let branding = Branding::default();
    let cache = AssetCache::default();
    let exporter = Exporter::new(&branding, &cache, dir.path());
    let user = user();

    let mut prompt = ExportPrompt::new(Cursor::new("q\n"), Vec::new());
    assert!(prompt.run(&exporter, &request(&records, &user, false)).unwrap().is_none());
    assert_eq!(prompt.state(), PromptState::Closed);

    let mut prompt = ExportPrompt::new(Cursor::new(""), Vec::new());
    assert_eq!(prompt.choose().unwrap(), ExportChoice::Cancelled);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_prompt_reopens_after_failure() {
    let dir = tempfile::tempdir().unwrap();
    let branding = Branding::default();
    let cache = AssetCache::default();
    let exporter = Exporter::new(&branding, &cache, dir.path());
    let user = user();

    let mut prompt = ExportPrompt::new(Cursor::new("pdf\n"), Vec::new());
    let result = prompt.run(&exporter, &request(&[], &user, false));

    assert!(matches!(result, Err(ExportError::EmptySchedule)));
    assert_eq!(prompt.state(), PromptState::Open);
    assert!(prompt.control_enabled());
}
