//! Page-layout renderer
//!
//! Draws the marksheet directly with `pdf-core`: institution header, student
//! info, a results table whose row height adapts to the subject count,
//! summary, signature slots and a generation footer. Positions are measured
//! from the top-left corner of the page.

use crate::config::{LayoutConfig, SignatureRole};
use crate::format::{exam_title, format_marks, year_semester};
use crate::{Marksheet, MarksheetRenderer, Result, SignatureSet};
use pdf_core::{Align, Color, ImageScaleMode, PageSize, PdfDocument, StandardFont};
use std::path::Path;
use tracing::{debug, warn};

/// Renders marksheets with the page-layout API
#[derive(Debug, Clone)]
pub struct LayoutRenderer {
    config: LayoutConfig,
    logo: Option<Vec<u8>>,
}

/// A table row as placed on the page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedRow {
    pub page: usize,
    pub y: f64,
    pub height: f64,
    pub header: bool,
}

/// What ended up in a signature slot
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedSlot {
    pub role: SignatureRole,
    pub label: String,
    pub image_drawn: bool,
}

/// A laid-out document together with the positions chosen for it
pub struct Composition {
    pub document: PdfDocument,
    pub header_bottom: f64,
    pub table_top: f64,
    pub base_row_height: f64,
    pub row_font_size: f32,
    pub rows: Vec<PlacedRow>,
    pub slots: Vec<PlacedSlot>,
}

struct Column {
    label: &'static str,
    x: f64,
    width: f64,
    align: Align,
}

impl LayoutRenderer {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config, logo: None }
    }

    /// Use `bytes` (PNG or JPEG) as the institution logo
    pub fn with_logo(mut self, bytes: Vec<u8>) -> Self {
        self.logo = Some(bytes);
        self
    }

    /// Load the logo from disk; a missing or unreadable file leaves the
    /// header without a logo
    pub fn with_logo_file<P: AsRef<Path>>(self, path: P) -> Self {
        let path = path.as_ref();
        match std::fs::read(path) {
            Ok(bytes) => self.with_logo(bytes),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "logo not available, rendering without it");
                self
            }
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    fn columns(&self) -> [Column; 4] {
        let cfg = &self.config;
        let x0 = cfg.margin;
        let course_x = x0 + cfg.serial_column_width;
        let mark_x = course_x + cfg.course_column_width();
        let grade_x = mark_x + cfg.mark_column_width;
        [
            Column { label: "S.No", x: x0, width: cfg.serial_column_width, align: Align::Center },
            Column { label: "Course", x: course_x, width: cfg.course_column_width(), align: Align::Left },
            Column { label: "Mark", x: mark_x, width: cfg.mark_column_width, align: Align::Center },
            Column { label: "Grade", x: grade_x, width: cfg.grade_column_width, align: Align::Center },
        ]
    }

    /// Lay out the whole document without serializing it
    pub fn compose(
        &self,
        marksheet: &Marksheet,
        signatures: &SignatureSet,
        generated_at: &str,
    ) -> Result<Composition> {
        let cfg = &self.config;
        let page_w = cfg.page_width;
        let page_h = cfg.page_height;
        let margin = cfg.margin;
        let content_w = cfg.content_width();

        let mut doc = PdfDocument::new(PageSize { width: page_w, height: page_h });
        let mut page = doc.add_page();

        // Header
        let header_top = margin;
        if let Some(logo) = &self.logo {
            if let Err(err) = doc.insert_image(
                logo,
                page,
                margin,
                header_top + cfg.logo_offset,
                cfg.logo_size,
                cfg.logo_size,
                ImageScaleMode::Stretch,
            ) {
                warn!(error = %err, "logo could not be embedded");
            }
        }

        let text_x = margin + cfg.logo_size + cfg.header_gap;
        let text_w = content_w - cfg.logo_size - cfg.header_gap;
        let mut cursor = header_top;
        let title = exam_title(
            marksheet.examination_name.as_deref(),
            marksheet.examination_date,
            &cfg.default_exam_name,
        );
        let title_line = crate::HeaderLine {
            text: title,
            font_size: cfg.exam_title_size,
            bold: true,
            spacing_after: 0.0,
        };
        for line in cfg.header_lines.iter().chain(std::iter::once(&title_line)) {
            doc.set_font(font_for(line.bold), line.font_size);
            cursor += doc.text_box(&line.text, page, text_x, cursor, text_w, Align::Center)?;
            cursor += line.spacing_after;
        }

        // The logo box counts even when no logo was drawn
        let header_bottom = cursor.max(header_top + cfg.logo_size);
        doc.set_line_width(cfg.rule_width);
        let rule_y = header_bottom + cfg.rule_gap;
        doc.draw_line(page, margin, rule_y, page_w - margin, rule_y)?;

        // Student info
        let mut y = header_bottom + cfg.content_gap;
        let student = &marksheet.student_details;
        let info_rows = [
            ("Register Number", student.reg_number.clone()),
            ("Student Name", student.name.clone()),
            ("Department", cfg.departments.display(&student.department)),
            ("Year/Semester", year_semester(marksheet)),
        ];
        let value_x = margin + cfg.info_label_width + cfg.info_value_gap;
        let value_w = content_w - cfg.info_label_width - cfg.info_value_gap;
        for (label, value) in &info_rows {
            let label = format!("{label}:");
            doc.set_font(StandardFont::HelveticaBold, cfg.info_font_size);
            let label_h = doc.text_box(&label, page, margin, y, cfg.info_label_width, Align::Left)?;
            doc.set_font(StandardFont::Helvetica, cfg.info_font_size);
            let value_h = doc.text_box(value, page, value_x, y, value_w, Align::Left)?;
            y += label_h.max(value_h) + cfg.info_row_gap;
        }

        // Results table
        let table_top = y + cfg.table_gap;
        let table_limit = page_h - margin - cfg.footer_reserve;
        let row_count = marksheet.subjects.len().max(1);
        let available = (table_limit - table_top).max(cfg.min_table_height);
        let base_row_height = (available / (row_count + 1) as f64)
            .floor()
            .max(cfg.min_row_height);
        let row_font_size = ((base_row_height - 6.0) as f32)
            .clamp(cfg.min_row_font_size, cfg.max_row_font_size);
        let header_height =
            base_row_height.max(row_font_size as f64 + 2.0 * cfg.cell_padding_y + 2.0);
        debug!(base_row_height, row_font_size, rows = row_count, "table sizing");

        let columns = self.columns();
        let header_cells = columns.iter().map(|c| c.label.to_string()).collect::<Vec<_>>();
        let mut rows = Vec::with_capacity(marksheet.subjects.len() + 1);

        y = table_top;
        self.draw_row(&mut doc, page, y, header_height, &columns, &header_cells, row_font_size, true)?;
        rows.push(PlacedRow { page, y, height: header_height, header: true });
        y += header_height;
        let mut page_body_rows = 0;

        for (index, subject) in marksheet.subjects.iter().enumerate() {
            let cells = vec![
                (index + 1).to_string(),
                subject.subject_name.clone(),
                format_marks(subject.marks.as_ref()),
                subject.grade.clone(),
            ];

            doc.set_font(StandardFont::Helvetica, row_font_size);
            let tallest = columns
                .iter()
                .zip(&cells)
                .map(|(col, text)| doc.height_of_string(text, col.width - 2.0 * cfg.cell_padding_x))
                .fold(0.0, f64::max);
            let height = base_row_height.max(tallest + 2.0 * cfg.cell_padding_y);

            if y + height > table_limit && page_body_rows > 0 {
                self.draw_footer(&mut doc, page, generated_at)?;
                page = doc.add_page();
                y = margin;
                self.draw_row(&mut doc, page, y, header_height, &columns, &header_cells, row_font_size, true)?;
                rows.push(PlacedRow { page, y, height: header_height, header: true });
                y += header_height;
                page_body_rows = 0;
            }

            self.draw_row(&mut doc, page, y, height, &columns, &cells, row_font_size, false)?;
            rows.push(PlacedRow { page, y, height, header: false });
            y += height;
            page_body_rows += 1;
        }

        // Summary
        let summary_y = y + cfg.summary_gap;
        doc.set_font(StandardFont::HelveticaBold, cfg.summary_font_size);
        let grade = marksheet
            .overall_grade
            .as_deref()
            .filter(|g| !g.is_empty())
            .unwrap_or("-");
        doc.insert_text(&format!("Overall Grade: {grade}"), page, margin, summary_y, Align::Left)?;
        doc.set_font(StandardFont::Helvetica, cfg.summary_font_size);
        doc.insert_text(
            &format!("Total Subjects: {}", marksheet.subjects.len()),
            page,
            margin + content_w / 2.0,
            summary_y,
            Align::Left,
        )?;

        let slots = self.draw_signatures(&mut doc, page, signatures)?;
        self.draw_footer(&mut doc, page, generated_at)?;

        Ok(Composition {
            document: doc,
            header_bottom,
            table_top,
            base_row_height,
            row_font_size,
            rows,
            slots,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_row(
        &self,
        doc: &mut PdfDocument,
        page: usize,
        y: f64,
        height: f64,
        columns: &[Column],
        cells: &[String],
        font_size: f32,
        header: bool,
    ) -> Result<()> {
        let pad_x = self.config.cell_padding_x;
        let pad_y = self.config.cell_padding_y;

        doc.stroke_rect(page, self.config.margin, y, self.config.content_width(), height)?;
        doc.set_font(font_for(header), font_size);
        for (col, text) in columns.iter().zip(cells) {
            doc.text_box(text, page, col.x + pad_x, y + pad_y, col.width - 2.0 * pad_x, col.align)?;
            let right = col.x + col.width;
            doc.draw_line(page, right, y, right, y + height)?;
        }
        Ok(())
    }

    fn draw_signatures(
        &self,
        doc: &mut PdfDocument,
        page: usize,
        signatures: &SignatureSet,
    ) -> Result<Vec<PlacedSlot>> {
        let cfg = &self.config;
        let signature_y = cfg.page_height - cfg.margin - cfg.signature_offset;
        let slot_w = cfg.content_width() / cfg.signature_slots.len() as f64;
        let inset = 10.0;

        let mut placed = Vec::with_capacity(cfg.signature_slots.len());
        for (i, slot) in cfg.signature_slots.iter().enumerate() {
            let slot_x = cfg.margin + i as f64 * slot_w;

            let image_drawn = match signatures.get(slot.role).and_then(|s| s.decode()) {
                Some(bytes) => match doc.insert_image(
                    &bytes,
                    page,
                    slot_x + inset,
                    signature_y - cfg.signature_image_gap,
                    slot_w - 2.0 * inset,
                    cfg.signature_image_height,
                    ImageScaleMode::FitCenter,
                ) {
                    Ok(_) => true,
                    Err(err) => {
                        warn!(role = ?slot.role, error = %err, "signature image could not be embedded");
                        false
                    }
                },
                None => false,
            };

            doc.draw_line(page, slot_x + inset, signature_y, slot_x + slot_w - inset, signature_y)?;
            doc.set_font(StandardFont::Helvetica, cfg.signature_label_size);
            doc.text_box(
                &slot.label,
                page,
                slot_x + inset,
                signature_y + 4.0,
                slot_w - 2.0 * inset,
                Align::Center,
            )?;

            placed.push(PlacedSlot {
                role: slot.role,
                label: slot.label.clone(),
                image_drawn,
            });
        }
        Ok(placed)
    }

    fn draw_footer(&self, doc: &mut PdfDocument, page: usize, generated_at: &str) -> Result<()> {
        let cfg = &self.config;
        doc.set_font(StandardFont::Helvetica, cfg.footer_font_size);
        doc.set_fill_color(Color::from_hex(&cfg.footer_color).unwrap_or_default());
        doc.text_box(
            &format!("Generated on {generated_at}"),
            page,
            cfg.margin,
            cfg.page_height - cfg.margin - cfg.footer_offset,
            cfg.content_width(),
            Align::Right,
        )?;
        doc.set_fill_color(Color::black());
        Ok(())
    }
}

fn font_for(bold: bool) -> StandardFont {
    if bold {
        StandardFont::HelveticaBold
    } else {
        StandardFont::Helvetica
    }
}

impl MarksheetRenderer for LayoutRenderer {
    fn render(&self, marksheet: &Marksheet, signatures: &SignatureSet) -> Result<Vec<u8>> {
        let generated_at = chrono::Local::now()
            .format("%-m/%-d/%Y, %-I:%M:%S %p")
            .to_string();
        let composition = self.compose(marksheet, signatures, &generated_at)?;
        Ok(composition.document.into_bytes()?)
    }
}
