//! Text shown on the marksheet, shared by both renderers

use crate::{Marks, Marksheet};
use chrono::{Datelike, NaiveDate};

const MONTHS: [&str; 12] = [
    "JANUARY", "FEBRUARY", "MARCH", "APRIL", "MAY", "JUNE", "JULY", "AUGUST", "SEPTEMBER",
    "OCTOBER", "NOVEMBER", "DECEMBER",
];

/// `NAME - MONTH - YEAR`, upper-cased
///
/// A blank name falls back to `default_name`. Without a date only the name
/// is shown.
pub fn exam_title(name: Option<&str>, date: Option<NaiveDate>, default_name: &str) -> String {
    let name = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(default_name)
        .to_uppercase();

    match date {
        Some(date) => {
            let month = MONTHS[date.month0() as usize];
            format!("{name} - {month} - {}", date.year())
        }
        None => name,
    }
}

/// `year` or `year/semester`
pub fn year_semester(marksheet: &Marksheet) -> String {
    let year = &marksheet.student_details.year;
    match marksheet.semester() {
        Some(semester) => format!("{year}/{semester}"),
        None => year.clone(),
    }
}

/// Marks as printed: whole numbers without a fraction, text verbatim,
/// absent marks empty
pub fn format_marks(marks: Option<&Marks>) -> String {
    marks.map(Marks::to_string).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DEFAULT: &str = "END SEMESTER EXAMINATIONS";

    #[test]
    fn test_exam_title_full() {
        let date = NaiveDate::from_ymd_opt(2024, 11, 20);
        assert_eq!(
            exam_title(Some("Model Examinations"), date, DEFAULT),
            "MODEL EXAMINATIONS - NOVEMBER - 2024"
        );
    }

    #[test]
    fn test_exam_title_default_name() {
        let date = NaiveDate::from_ymd_opt(2025, 4, 1);
        assert_eq!(
            exam_title(None, date, DEFAULT),
            "END SEMESTER EXAMINATIONS - APRIL - 2025"
        );
        assert_eq!(
            exam_title(Some("  "), date, DEFAULT),
            "END SEMESTER EXAMINATIONS - APRIL - 2025"
        );
    }

    #[test]
    fn test_exam_title_without_date() {
        assert_eq!(exam_title(Some("Arrear"), None, DEFAULT), "ARREAR");
    }

    #[test]
    fn test_format_marks() {
        assert_eq!(format_marks(Some(&Marks::Number(87.0))), "87");
        assert_eq!(format_marks(Some(&Marks::Number(72.5))), "72.5");
        assert_eq!(format_marks(Some(&Marks::Number(0.0))), "0");
        assert_eq!(format_marks(Some(&Marks::Text("AB".to_string()))), "AB");
        assert_eq!(format_marks(None), "");
    }

    #[test]
    fn test_year_semester() {
        let mut m: Marksheet = serde_json::from_value(serde_json::json!({
            "_id": "1",
            "studentDetails": { "regNumber": "1", "name": "A", "department": "IT", "year": "II" }
        }))
        .unwrap();
        assert_eq!(year_semester(&m), "II");

        m.semester = Some("4".to_string());
        assert_eq!(year_semester(&m), "II/4");
    }
}
