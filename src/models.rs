use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub struct DisciplineRecord {
    pub school_year: i64,
    pub district_code: i64,
    pub district_name: String,
    pub school_code: i64,
    pub organization_name: String,
    pub race: String,
    pub gender: String,
    pub grade: String,
    pub special_demographic: String,
    pub geography: String,
    pub sub_group: String,
    pub category: String,
    pub row_status: String,
    pub student_count: i64,
    pub enrollment_count: i64,
    pub percent_of_enrollment: f64,
    pub incident_count: i64,
    pub average_duration: f64,
}

/// A snapshot row projected down to the columns the API serves.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredRow {
    /// 0-based position of the row among the file's data rows.
    pub index: usize,
    pub sub_group: String,
    pub category: String,
    pub student_count: i64,
    pub enrollment_count: i64,
    pub percent_of_enrollment: f64,
    pub incident_count: i64,
    pub average_duration: f64,
}

impl FilteredRow {
    pub fn project(index: usize, record: DisciplineRecord) -> Self {
        Self {
            index,
            sub_group: record.sub_group,
            category: record.category,
            student_count: record.student_count,
            enrollment_count: record.enrollment_count,
            percent_of_enrollment: record.percent_of_enrollment,
            incident_count: record.incident_count,
            average_duration: record.average_duration,
        }
    }
}

/// The snapshot built once at startup. Never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct FilteredTable {
    rows: Vec<FilteredRow>,
}

impl FilteredTable {
    pub fn new(rows: Vec<FilteredRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[FilteredRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRecord {
    pub index: usize,
    pub name: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "StudentCount")]
    pub student_count: i64,
    #[serde(rename = "EnrollmentCount")]
    pub enrollment_count: i64,
    pub value: f64,
    #[serde(rename = "IncidentCount")]
    pub incident_count: i64,
    #[serde(rename = "AverageDuration")]
    pub average_duration: f64,
}

impl From<&FilteredRow> for OutputRecord {
    fn from(row: &FilteredRow) -> Self {
        Self {
            index: row.index,
            name: row.sub_group.clone(),
            category: row.category.clone(),
            student_count: row.student_count,
            enrollment_count: row.enrollment_count,
            value: row.percent_of_enrollment,
            incident_count: row.incident_count,
            average_duration: row.average_duration,
        }
    }
}
