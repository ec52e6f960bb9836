//! HTML print document for the browser renderer

use crate::config::LayoutConfig;
use crate::format::{exam_title, format_marks, year_semester};
use crate::{Marksheet, Result, SignatureSet};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use tera::{Context, Tera};

pub const TEMPLATE_NAME: &str = "marksheet.html";
const TEMPLATE: &str = include_str!("../templates/marksheet.html");

/// Last element of the sheet; present once the whole page has been parsed
pub const READY_SELECTOR: &str = ".sheet > .footer";

#[derive(Debug, Serialize)]
struct HeaderLineView<'a> {
    text: &'a str,
    font_size: f32,
    bold: bool,
}

#[derive(Debug, Serialize)]
struct StudentView {
    reg_number: String,
    name: String,
    department: String,
    year_semester: String,
}

/// One results row; padding rows have every field empty
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowView {
    pub serial: String,
    pub course: String,
    pub mark: String,
    pub grade: String,
}

#[derive(Debug, Serialize)]
struct SlotView {
    label: String,
    src: Option<String>,
}

#[derive(Debug, Serialize)]
struct PageView<'a> {
    header_lines: Vec<HeaderLineView<'a>>,
    exam_title: String,
    exam_title_size: f32,
    logo_src: Option<&'a str>,
    student: StudentView,
    rows: Vec<RowView>,
    overall_grade: &'a str,
    total_subjects: usize,
    signatures: Vec<SlotView>,
    generated_at: &'a str,
    footer_color: &'a str,
}

/// Builds the marksheet as a self-contained HTML page
///
/// The logo and signatures are inlined so the page needs no network access
/// (remote signature URLs are the exception).
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    tera: Tera,
    config: LayoutConfig,
    logo_src: Option<String>,
}

impl HtmlDocument {
    pub fn new(config: LayoutConfig) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, TEMPLATE)?;
        Ok(Self {
            tera,
            config,
            logo_src: None,
        })
    }

    /// Inline `bytes` as the logo
    pub fn with_logo(mut self, bytes: &[u8]) -> Self {
        let mime = if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            "image/jpeg"
        } else {
            "image/png"
        };
        self.logo_src = Some(format!("data:{mime};base64,{}", STANDARD.encode(bytes)));
        self
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Subject rows padded with blank rows up to the configured minimum
    pub fn rows(&self, marksheet: &Marksheet) -> Vec<RowView> {
        let target = marksheet.subjects.len().max(self.config.html_min_rows);
        let mut rows: Vec<RowView> = marksheet
            .subjects
            .iter()
            .enumerate()
            .map(|(i, s)| RowView {
                serial: (i + 1).to_string(),
                course: s.subject_name.clone(),
                mark: format_marks(s.marks.as_ref()),
                grade: s.grade.clone(),
            })
            .collect();
        rows.resize(
            target,
            RowView {
                serial: String::new(),
                course: String::new(),
                mark: String::new(),
                grade: String::new(),
            },
        );
        rows
    }

    pub fn render(
        &self,
        marksheet: &Marksheet,
        signatures: &SignatureSet,
        generated_at: &str,
    ) -> Result<String> {
        let cfg = &self.config;
        let student = &marksheet.student_details;
        let view = PageView {
            header_lines: cfg
                .header_lines
                .iter()
                .map(|l| HeaderLineView {
                    text: &l.text,
                    font_size: l.font_size,
                    bold: l.bold,
                })
                .collect(),
            exam_title: exam_title(
                marksheet.examination_name.as_deref(),
                marksheet.examination_date,
                &cfg.default_exam_name,
            ),
            exam_title_size: cfg.exam_title_size,
            logo_src: self.logo_src.as_deref(),
            student: StudentView {
                reg_number: student.reg_number.clone(),
                name: student.name.clone(),
                department: cfg.departments.display(&student.department),
                year_semester: year_semester(marksheet),
            },
            rows: self.rows(marksheet),
            overall_grade: marksheet
                .overall_grade
                .as_deref()
                .filter(|g| !g.is_empty())
                .unwrap_or("-"),
            total_subjects: marksheet.subjects.len(),
            signatures: cfg
                .signature_slots
                .iter()
                .map(|slot| SlotView {
                    label: slot.label.clone(),
                    src: signatures.get(slot.role).map(|s| s.to_img_src()),
                })
                .collect(),
            generated_at,
            footer_color: &cfg.footer_color,
        };

        let context = Context::from_serialize(&view)?;
        Ok(self.tera.render(TEMPLATE_NAME, &context)?)
    }
}
