//! Weekly class timetable export.
//!
//! A flat list of schedule records is laid out on a fixed slot x weekday grid
//! ([`placement`]), decorated with display text ([`format`]) and rendered as
//! a paginated PDF ([`pdf`]) or as CSV ([`csv_export`]). [`export`] ties the
//! pieces together behind two entry points and an interactive prompt.

pub mod assets;
pub mod config;
pub mod csv_export;
pub mod error;
pub mod export;
pub mod format;
pub mod model;
pub mod pdf;
pub mod placement;
pub mod section;
pub mod time_grid;

pub use assets::AssetCache;
pub use config::Branding;
pub use error::ExportError;
pub use export::{ExportChoice, ExportFormat, ExportOutcome, ExportPrompt, ExportRequest, Exporter};
pub use model::{ScheduleRecord, UserInfo};
pub use placement::{build_grid, Diagnostics, PlacementIssue};
