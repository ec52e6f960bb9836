//! Layout configuration
//!
//! Every layout constant lives here so the renderers carry no inline
//! literals. All fields have defaults; a JSON file may override any subset.

use crate::{MarksheetError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One centered line of the institution header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderLine {
    pub text: String,
    pub font_size: f32,
    #[serde(default)]
    pub bold: bool,
    /// Vertical space after the line, in points
    #[serde(default)]
    pub spacing_after: f64,
}

impl HeaderLine {
    fn new(text: &str, font_size: f32, bold: bool, spacing_after: f64) -> Self {
        Self {
            text: text.to_string(),
            font_size,
            bold,
            spacing_after,
        }
    }
}

/// Whose signature a slot shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureRole {
    /// Class teacher (the marksheet's staff record)
    Staff,
    /// Head of department
    Hod,
    Principal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureSlot {
    pub role: SignatureRole,
    pub label: String,
}

/// Department code to full name; unknown codes map to themselves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DepartmentTable(BTreeMap<String, String>);

impl DepartmentTable {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self(entries)
    }

    pub fn expand<'a>(&'a self, code: &'a str) -> &'a str {
        self.0.get(code).map(String::as_str).unwrap_or(code)
    }

    /// Degree-prefixed name shown on the marksheet
    pub fn display(&self, code: &str) -> String {
        format!("B.Tech {}", self.expand(code))
    }
}

impl Default for DepartmentTable {
    fn default() -> Self {
        let entries = [
            ("AI_DS", "Artificial Intelligence and Data Science"),
            ("CSE", "Computer Science and Engineering"),
            ("IT", "Information Technology"),
            ("ECE", "Electronics and Communication Engineering"),
            ("EEE", "Electrical and Electronics Engineering"),
            ("MECH", "Mechanical Engineering"),
            ("CIVIL", "Civil Engineering"),
        ];
        Self(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

/// Page geometry, typography and tables used by both renderers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub page_width: f64,
    pub page_height: f64,
    pub margin: f64,

    // Header
    pub logo_size: f64,
    /// Logo sits this far below the header top
    pub logo_offset: f64,
    pub header_gap: f64,
    pub header_lines: Vec<HeaderLine>,
    pub exam_title_size: f32,
    pub default_exam_name: String,
    pub rule_gap: f64,
    pub rule_width: f64,
    /// Space between the header rule and the student info
    pub content_gap: f64,

    // Student info
    pub info_font_size: f32,
    pub info_label_width: f64,
    pub info_value_gap: f64,
    pub info_row_gap: f64,
    /// Space between the student info and the table
    pub table_gap: f64,

    // Results table
    pub serial_column_width: f64,
    pub mark_column_width: f64,
    pub grade_column_width: f64,
    pub footer_reserve: f64,
    pub min_table_height: f64,
    pub min_row_height: f64,
    pub min_row_font_size: f32,
    pub max_row_font_size: f32,
    pub cell_padding_x: f64,
    pub cell_padding_y: f64,

    // Summary
    pub summary_gap: f64,
    pub summary_font_size: f32,

    // Signatures
    pub signature_offset: f64,
    pub signature_image_height: f64,
    pub signature_image_gap: f64,
    pub signature_label_size: f32,
    pub signature_slots: Vec<SignatureSlot>,

    // Footer
    pub footer_font_size: f32,
    pub footer_color: String,
    pub footer_offset: f64,

    /// Minimum rows in the HTML results table
    pub html_min_rows: usize,

    pub departments: DepartmentTable,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_width: 595.28,
            page_height: 841.89,
            margin: 40.0,
            logo_size: 75.0,
            logo_offset: 2.0,
            header_gap: 18.0,
            header_lines: vec![
                HeaderLine::new("MEENAKSHI SUNDARARAJAN ENGINEERING COLLEGE", 16.0, true, 4.0),
                HeaderLine::new(
                    "(AN AUTONOMOUS INSTITUTION AFFILIATED TO ANNA UNIVERSITY.)",
                    10.0,
                    false,
                    2.0,
                ),
                HeaderLine::new("363, ARCOT ROAD, KODAMBAKKAM, CHENNAI-600024", 10.0, false, 4.0),
                HeaderLine::new("OFFICE OF THE CONTROLLER OF EXAMINATIONS", 12.0, true, 4.0),
            ],
            exam_title_size: 10.0,
            default_exam_name: "END SEMESTER EXAMINATIONS".to_string(),
            rule_gap: 6.0,
            rule_width: 0.75,
            content_gap: 16.0,
            info_font_size: 11.0,
            info_label_width: 140.0,
            info_value_gap: 6.0,
            info_row_gap: 6.0,
            table_gap: 16.0,
            serial_column_width: 45.0,
            mark_column_width: 70.0,
            grade_column_width: 60.0,
            footer_reserve: 140.0,
            min_table_height: 120.0,
            min_row_height: 20.0,
            min_row_font_size: 9.0,
            max_row_font_size: 12.0,
            cell_padding_x: 6.0,
            cell_padding_y: 4.0,
            summary_gap: 6.0,
            summary_font_size: 11.0,
            signature_offset: 60.0,
            signature_image_height: 40.0,
            signature_image_gap: 45.0,
            signature_label_size: 9.0,
            signature_slots: vec![
                SignatureSlot {
                    role: SignatureRole::Staff,
                    label: "Signature of Staff".to_string(),
                },
                SignatureSlot {
                    role: SignatureRole::Hod,
                    label: "Signature of HOD".to_string(),
                },
                SignatureSlot {
                    role: SignatureRole::Principal,
                    label: "Signature of Principal".to_string(),
                },
            ],
            footer_font_size: 8.0,
            footer_color: "#555555".to_string(),
            footer_offset: 20.0,
            html_min_rows: 10,
            departments: DepartmentTable::default(),
        }
    }
}

impl LayoutConfig {
    /// Parse overrides from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Width between the left and right margins
    pub fn content_width(&self) -> f64 {
        self.page_width - 2.0 * self.margin
    }

    /// Width left for the course column after the fixed columns
    pub fn course_column_width(&self) -> f64 {
        self.content_width()
            - self.serial_column_width
            - self.mark_column_width
            - self.grade_column_width
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_width <= 0.0 || self.page_height <= 0.0 {
            return Err(MarksheetError::Config("page size must be positive".to_string()));
        }
        if self.content_width() <= 0.0 {
            return Err(MarksheetError::Config(
                "margins leave no room for content".to_string(),
            ));
        }
        if self.course_column_width() <= 2.0 * self.cell_padding_x {
            return Err(MarksheetError::Config(
                "fixed table columns are wider than the page".to_string(),
            ));
        }
        if self.min_row_font_size > self.max_row_font_size {
            return Err(MarksheetError::Config(format!(
                "row font range {}..{} is empty",
                self.min_row_font_size, self.max_row_font_size
            )));
        }
        if self.signature_slots.is_empty() {
            return Err(MarksheetError::Config(
                "at least one signature slot is required".to_string(),
            ));
        }
        Ok(())
    }
}
