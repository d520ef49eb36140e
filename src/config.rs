// Institution branding shown on every exported timetable.

use serde::Deserialize;
use std::path::Path;

use crate::error::ExportError;

/// Text that brands the header, CSV preamble and footer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Branding {
    pub institution_name: String,
    pub campus_line: String,
    pub product_name: String,
    /// Centered title block under the logos; the first line is set in bold.
    pub header_lines: Vec<String>,
    pub assets: BrandAssets,
}

/// Image sources (paths or URLs) for the header logos and the footer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BrandAssets {
    pub logos: Vec<String>,
    pub footer: Option<String>,
}

impl Default for Branding {
    fn default() -> Self {
        let institution_name = "State University".to_string();
        let campus_line = "Main Campus".to_string();
        Branding {
            header_lines: vec![
                institution_name.clone(),
                campus_line.clone(),
                "Office of the Registrar".to_string(),
                "CLASS SCHEDULE".to_string(),
            ],
            institution_name,
            campus_line,
            product_name: "Class Scheduling System".to_string(),
            assets: BrandAssets::default(),
        }
    }
}

impl Branding {
    /// Read branding from a TOML file; omitted keys keep their defaults.
    pub fn load(path: &Path) -> Result<Branding, ExportError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ExportError::Config(format!("{}: {}", path.display(), e)))?;
        Branding::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Branding, ExportError> {
        let branding: Branding =
            toml::from_str(content).map_err(|e| ExportError::Config(e.to_string()))?;
        if branding.assets.logos.len() > 3 {
            return Err(ExportError::Config(format!(
                "at most 3 logos are supported, got {}",
                branding.assets.logos.len()
            )));
        }
        Ok(branding)
    }

    /// Text used when no footer image is available.
    pub fn footer_text(&self) -> String {
        format!("{} | {}", self.product_name, self.institution_name)
    }
}
