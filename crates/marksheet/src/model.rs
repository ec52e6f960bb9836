//! Marksheet data model
//!
//! Field names follow the stored JSON documents (camelCase, `_id` keys).

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A per-student results record for one examination cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marksheet {
    /// Store identifier
    #[serde(rename = "_id", alias = "id")]
    pub id: String,

    /// Human-facing identifier, used in download file names
    #[serde(default)]
    pub marksheet_id: Option<String>,

    pub student_details: StudentDetails,

    /// Semester recorded on the marksheet itself; preferred over the one in
    /// the student details when both are present
    #[serde(default, deserialize_with = "string_or_number_opt")]
    pub semester: Option<String>,

    #[serde(default)]
    pub examination_name: Option<String>,

    /// Unparseable dates deserialize as `None`
    #[serde(default, deserialize_with = "lenient_date")]
    pub examination_date: Option<NaiveDate>,

    #[serde(default)]
    pub subjects: Vec<SubjectResult>,

    #[serde(default)]
    pub overall_grade: Option<String>,

    /// Class teacher's staff record
    #[serde(default)]
    pub staff_id: Option<String>,

    /// Head of department's staff record
    #[serde(default)]
    pub hod_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDetails {
    pub reg_number: String,
    pub name: String,
    /// Department code, e.g. "CSE"
    pub department: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub year: String,
    #[serde(default, deserialize_with = "string_or_number_opt")]
    pub semester: Option<String>,
}

/// One row of the results table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectResult {
    pub subject_name: String,
    #[serde(default, deserialize_with = "lenient_marks")]
    pub marks: Option<Marks>,
    #[serde(default)]
    pub grade: String,
}

/// A subject's marks as entered
///
/// Numeric text such as `"87"` is read as a number; anything else (`"AB"`
/// for absent, `"RA"`) is kept verbatim and printed as is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Marks {
    Number(f64),
    Text(String),
}

impl Marks {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Marks::Number(n) => Some(*n),
            Marks::Text(_) => None,
        }
    }
}

impl fmt::Display for Marks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Marks::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Marks::Number(n) => write!(f, "{n}"),
            Marks::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Data URI, bare base64 or an external URL
    #[serde(default)]
    pub e_signature: Option<String>,
}

/// A marksheet with its staff references resolved
#[derive(Debug, Clone, PartialEq)]
pub struct MarksheetRecord {
    pub marksheet: Marksheet,
    pub staff: Option<StaffMember>,
    pub hod: Option<StaffMember>,
}

impl Marksheet {
    /// Display id, falling back to the store id
    pub fn display_id(&self) -> &str {
        self.marksheet_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .unwrap_or(&self.id)
    }

    /// `marksheet_<regNumber>_<displayId>.pdf`
    pub fn download_filename(&self) -> String {
        format!(
            "marksheet_{}_{}.pdf",
            self.student_details.reg_number,
            self.display_id()
        )
    }

    /// Semester from the marksheet, else from the student details
    pub fn semester(&self) -> Option<&str> {
        self.semester
            .as_deref()
            .or(self.student_details.semester.as_deref())
            .filter(|s| !s.is_empty())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Integer(i64),
    Float(f64),
}

impl From<StringOrNumber> for String {
    fn from(value: StringOrNumber) -> Self {
        match value {
            StringOrNumber::String(s) => s,
            StringOrNumber::Integer(n) => n.to_string(),
            StringOrNumber::Float(f) => f.to_string(),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<StringOrNumber>::deserialize(deserializer)?
        .map(String::from)
        .unwrap_or_default())
}

fn string_or_number_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<StringOrNumber>::deserialize(deserializer)?.map(String::from))
}

/// Numbers, numeric strings and free text; blank strings and other JSON
/// shapes are treated as absent
fn lenient_marks<'de, D>(deserializer: D) -> Result<Option<Marks>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64().map(Marks::Number),
        Some(serde_json::Value::String(s)) => {
            let text = s.trim();
            if text.is_empty() {
                None
            } else {
                Some(match text.parse::<f64>() {
                    Ok(n) if n.is_finite() => Marks::Number(n),
                    _ => Marks::Text(text.to_string()),
                })
            }
        }
        _ => None,
    })
}

/// Accepts `YYYY-MM-DD`, RFC 3339 date-times, naive date-times and epoch
/// milliseconds. Anything else becomes `None` rather than an error.
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => parse_date(&s),
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| dt.date_naive()),
        _ => None,
    })
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.date())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_json() -> serde_json::Value {
        serde_json::json!({
            "_id": "665f1c2a9b1e",
            "marksheetId": "MS-2024-001",
            "studentDetails": {
                "regNumber": "311521104001",
                "name": "Asha",
                "department": "CSE",
                "year": 3,
                "semester": "5"
            },
            "examinationName": "End Semester Examinations",
            "examinationDate": "2024-05-14T00:00:00.000Z",
            "subjects": [
                { "subjectName": "Compiler Design", "marks": 87, "grade": "A" },
                { "subjectName": "Networks", "grade": "B+" }
            ],
            "overallGrade": "A",
            "staffId": "s1",
            "hodId": "h1"
        })
    }

    #[test]
    fn test_deserialize_marksheet() {
        let m: Marksheet = serde_json::from_value(sample_json()).unwrap();
        assert_eq!(m.id, "665f1c2a9b1e");
        assert_eq!(m.student_details.year, "3");
        assert_eq!(m.semester(), Some("5"));
        assert_eq!(m.examination_date, NaiveDate::from_ymd_opt(2024, 5, 14));
        assert_eq!(m.subjects[0].marks, Some(Marks::Number(87.0)));
        assert_eq!(m.subjects[1].marks, None);
        assert_eq!(m.staff_id.as_deref(), Some("s1"));
    }

    #[test]
    fn test_marks_from_text() {
        let mut json = sample_json();
        json["subjects"] = serde_json::json!([
            { "subjectName": "A", "marks": "87" },
            { "subjectName": "B", "marks": " 64.5 " },
            { "subjectName": "C", "marks": "AB" },
            { "subjectName": "D", "marks": "" },
            { "subjectName": "E", "marks": null },
            { "subjectName": "F", "marks": true }
        ]);
        let m: Marksheet = serde_json::from_value(json).unwrap();
        let marks: Vec<_> = m.subjects.iter().map(|s| s.marks.clone()).collect();
        assert_eq!(
            marks,
            vec![
                Some(Marks::Number(87.0)),
                Some(Marks::Number(64.5)),
                Some(Marks::Text("AB".to_string())),
                None,
                None,
                None,
            ]
        );
        assert_eq!(marks[2].as_ref().and_then(Marks::as_number), None);
    }

    #[test]
    fn test_invalid_date_is_none() {
        let mut json = sample_json();
        json["examinationDate"] = serde_json::json!("not a date");
        let m: Marksheet = serde_json::from_value(json).unwrap();
        assert_eq!(m.examination_date, None);
    }

    #[test]
    fn test_date_variants() {
        assert_eq!(parse_date("2024-11-02"), NaiveDate::from_ymd_opt(2024, 11, 2));
        assert_eq!(parse_date("2024-11-02T10:30:00"), NaiveDate::from_ymd_opt(2024, 11, 2));
        assert_eq!(parse_date("2024-11-02T10:30:00+05:30"), NaiveDate::from_ymd_opt(2024, 11, 2));
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_epoch_millis_date() {
        let mut json = sample_json();
        json["examinationDate"] = serde_json::json!(1_715_644_800_000i64);
        let m: Marksheet = serde_json::from_value(json).unwrap();
        assert_eq!(m.examination_date, NaiveDate::from_ymd_opt(2024, 5, 14));
    }

    #[test]
    fn test_minimal_marksheet() {
        let m: Marksheet = serde_json::from_value(serde_json::json!({
            "id": "x",
            "studentDetails": { "regNumber": "1", "name": "B", "department": "IT" }
        }))
        .unwrap();
        assert!(m.subjects.is_empty());
        assert_eq!(m.student_details.year, "");
        assert_eq!(m.semester(), None);
        assert_eq!(m.examination_date, None);
    }

    #[test]
    fn test_download_filename() {
        let mut m: Marksheet = serde_json::from_value(sample_json()).unwrap();
        assert_eq!(m.download_filename(), "marksheet_311521104001_MS-2024-001.pdf");

        m.marksheet_id = None;
        assert_eq!(m.download_filename(), "marksheet_311521104001_665f1c2a9b1e.pdf");
    }

    #[test]
    fn test_top_level_semester_wins() {
        let mut json = sample_json();
        json["semester"] = serde_json::json!(6);
        let m: Marksheet = serde_json::from_value(json).unwrap();
        assert_eq!(m.semester(), Some("6"));
    }

    #[test]
    fn test_staff_member_signature_field() {
        let staff: StaffMember =
            serde_json::from_str(r#"{"_id":"s1","name":"R. Kumar","eSignature":"data:image/png;base64,AAAA"}"#)
                .unwrap();
        assert_eq!(staff.e_signature.as_deref(), Some("data:image/png;base64,AAAA"));
    }
}
