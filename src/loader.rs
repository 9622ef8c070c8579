use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::info;

use crate::config::SnapshotFilter;
use crate::error::LoadError;
use crate::models::{DisciplineRecord, FilteredRow, FilteredTable};

pub const COLUMN_COUNT: usize = 18;

/// Canonical column names. The file's own header row is discarded in favour of these.
pub const COLUMNS: [&str; COLUMN_COUNT] = [
    "SchoolYear",
    "DistrictCode",
    "DistrictName",
    "SchoolCode",
    "OrganizationName",
    "Race",
    "Gender",
    "Grade",
    "SpecialDemographic",
    "Geography",
    "SubGroup",
    "Category",
    "RowStatus",
    "StudentCount",
    "EnrollmentCount",
    "PercentOfEnrollment",
    "IncidentCount",
    "AverageDuration",
];

/// Cell contents the source data uses for "no value".
const NA_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn load_table(path: &Path, filter: &SnapshotFilter) -> Result<FilteredTable, LoadError> {
    info!("Loading discipline records from {}", path.display());

    let file = File::open(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => LoadError::NotFound {
            path: path.to_path_buf(),
        },
        _ => LoadError::Io(err),
    })?;

    read_table(file, filter)
}

pub fn read_table<R: Read>(input: R, filter: &SnapshotFilter) -> Result<FilteredTable, LoadError> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(input);

    let header_width = reader.headers()?.len();
    if header_width == 0 {
        return Err(LoadError::MissingHeader);
    }
    if header_width != COLUMN_COUNT {
        return Err(LoadError::Schema {
            line: 1,
            expected: COLUMN_COUNT,
            found: header_width,
        });
    }

    let mut records = Vec::new();
    for result in reader.records() {
        let raw = result?;
        let line = raw.position().map(|pos| pos.line()).unwrap_or_default();
        records.push(parse_record(&raw, line)?);
    }
    let rows_read = records.len();

    let rows: Vec<FilteredRow> = records
        .into_iter()
        .enumerate()
        .filter(|(_, record)| filter.matches(record))
        .map(|(index, record)| FilteredRow::project(index, record))
        .collect();
    info!(
        rows_read,
        rows_kept = rows.len(),
        "Snapshot ready: kept {} of {} rows",
        rows.len(),
        rows_read
    );

    Ok(FilteredTable::new(rows))
}

fn parse_record(raw: &StringRecord, line: u64) -> Result<DisciplineRecord, LoadError> {
    // Short rows are padded with missing cells; long rows are a schema error.
    if raw.len() > COLUMN_COUNT {
        return Err(LoadError::Schema {
            line,
            expected: COLUMN_COUNT,
            found: raw.len(),
        });
    }

    let cells = Cells { raw, line };
    Ok(DisciplineRecord {
        school_year: cells.integer(0)?,
        district_code: cells.integer(1)?,
        district_name: cells.text(2),
        school_code: cells.integer(3)?,
        organization_name: cells.text(4),
        race: cells.text(5),
        gender: cells.text(6),
        grade: cells.text(7),
        special_demographic: cells.text(8),
        geography: cells.text(9),
        sub_group: cells.text(10),
        category: cells.text(11),
        row_status: cells.text(12),
        student_count: cells.integer(13)?,
        enrollment_count: cells.integer(14)?,
        percent_of_enrollment: cells.float(15)?,
        incident_count: cells.integer(16)?,
        average_duration: cells.float(17)?,
    })
}

fn is_missing(cell: &str) -> bool {
    NA_MARKERS.contains(&cell)
}

struct Cells<'a> {
    raw: &'a StringRecord,
    line: u64,
}

impl Cells<'_> {
    /// `None` when the cell is absent or holds a missing-value marker.
    fn present(&self, idx: usize) -> Option<&str> {
        self.raw.get(idx).filter(|cell| !is_missing(cell))
    }

    fn text(&self, idx: usize) -> String {
        self.present(idx).unwrap_or_default().to_string()
    }

    fn integer(&self, idx: usize) -> Result<i64, LoadError> {
        let Some(cell) = self.present(idx) else {
            return Ok(0);
        };
        let trimmed = cell.trim();
        if let Ok(value) = trimmed.parse::<i64>() {
            return Ok(value);
        }
        // Integer columns with gaps are sometimes exported as "12.0".
        match trimmed.parse::<f64>() {
            Ok(value)
                if value.is_finite()
                    && value.fract() == 0.0
                    && value.abs() < i64::MAX as f64 =>
            {
                Ok(value as i64)
            }
            _ => Err(self.parse_error(idx, cell, "integer")),
        }
    }

    fn float(&self, idx: usize) -> Result<f64, LoadError> {
        let Some(cell) = self.present(idx) else {
            return Ok(0.0);
        };
        match cell.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(self.parse_error(idx, cell, "float")),
        }
    }

    fn parse_error(&self, idx: usize, cell: &str, expected: &'static str) -> LoadError {
        LoadError::Parse {
            line: self.line,
            column: COLUMNS[idx],
            value: cell.to_string(),
            expected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "School Year,District Code,District,School Code,Organization,Race,Gender,Grade,SpecialDemo,Geography,SubGroup,Category,Rowstatus,Students,Enrollment,PctEnrollment,Incidents,AvgDuration";

    fn row(year: &str, district: &str, sub_group: &str, category: &str, pct: &str) -> String {
        format!(
            "{year},0,{district},0,{district},All Students,All Students,All Students,All Students,State,{sub_group},{category},Reported,12,100,{pct},5,1.5"
        )
    }

    fn read(lines: &[String]) -> Result<FilteredTable, LoadError> {
        let mut text = String::from(HEADER);
        for line in lines {
            text.push('\n');
            text.push_str(line);
        }
        read_table(text.as_bytes(), &SnapshotFilter::default())
    }

    #[test]
    fn applies_every_snapshot_predicate() {
        let lines = vec![
            row("2025", "State of Delaware", "African American", "In-School Suspension", "12.3"),
            row("2024", "State of Delaware", "African American", "In-School Suspension", "1.0"),
            row("2025", "Christina School District", "African American", "In-School Suspension", "2.0"),
            row("2025", "State of Delaware", "African American", "Out-of-School Suspension", "3.0"),
            "2025,0,State of Delaware,0,x,All Students,Male,All Students,All Students,State,All Students,In-School Suspension,Reported,1,1,4.0,1,1.0".to_string(),
            "2025,0,State of Delaware,0,x,All Students,All Students,Grade 9,All Students,State,All Students,In-School Suspension,Reported,1,1,5.0,1,1.0".to_string(),
            row("2025", "State of Delaware", "All Students", "In-School Suspension", "100.0"),
        ];

        let table = read(&lines).unwrap();
        assert_eq!(table.len(), 2);
        let first = &table.rows()[0];
        assert_eq!(first.index, 0);
        assert_eq!(first.sub_group, "African American");
        assert_eq!(first.category, "In-School Suspension");
        assert_eq!(first.student_count, 12);
        assert_eq!(first.enrollment_count, 100);
        assert!((first.percent_of_enrollment - 12.3).abs() < 1e-9);
        assert_eq!(first.incident_count, 5);
        assert!((first.average_duration - 1.5).abs() < 1e-9);
        assert_eq!(table.rows()[1].index, 6);
        assert_eq!(table.rows()[1].sub_group, "All Students");
    }

    #[test]
    fn custom_filter_selects_another_snapshot() {
        let lines = vec![
            row("2025", "State of Delaware", "Low Income", "In-School Suspension", "7.0"),
            row("2023", "State of Delaware", "Low Income", "Expulsion", "8.0"),
        ];
        let text = format!("{HEADER}\n{}\n{}", lines[0], lines[1]);
        let filter = SnapshotFilter {
            school_year: 2023,
            category: "Expulsion".to_string(),
            ..SnapshotFilter::default()
        };

        let table = read_table(text.as_bytes(), &filter).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].index, 1);
    }

    #[test]
    fn missing_cells_become_zero_values() {
        let line = "2025,,State of Delaware,NA,,,All Students,All Students,,,Homeless,In-School Suspension,,,nan,,NULL,".to_string();
        let table = read(&[line]).unwrap();
        assert_eq!(table.len(), 1);
        let only = &table.rows()[0];
        assert_eq!(only.sub_group, "Homeless");
        assert_eq!(only.student_count, 0);
        assert_eq!(only.enrollment_count, 0);
        assert_eq!(only.percent_of_enrollment, 0.0);
        assert_eq!(only.incident_count, 0);
        assert_eq!(only.average_duration, 0.0);
    }

    #[test]
    fn short_rows_are_padded_with_missing_cells() {
        let line = "2025,10,State of Delaware,0,x,All Students,All Students,All Students,All Students,State,Homeless,In-School Suspension,Reported,3".to_string();
        let table = read(&[line]).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].student_count, 3);
        assert_eq!(table.rows()[0].average_duration, 0.0);
    }

    #[test]
    fn integral_decimals_are_accepted_for_integer_columns() {
        let line = "2025.0,0,State of Delaware,0,x,All Students,All Students,All Students,All Students,State,All Students,In-School Suspension,Reported, 40.0 ,400,10.0,41,2.25".to_string();
        let table = read(&[line]).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].student_count, 40);
    }

    #[test]
    fn fractional_integer_is_a_parse_error() {
        let line = row("2025", "State of Delaware", "All Students", "In-School Suspension", "1.0")
            .replacen(",12,100,", ",12.5,100,", 1);
        match read(&[line]) {
            Err(LoadError::Parse {
                line,
                column,
                value,
                expected,
            }) => {
                assert_eq!(line, 2);
                assert_eq!(column, "StudentCount");
                assert_eq!(value, "12.5");
                assert_eq!(expected, "integer");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_numbers_fail_even_outside_the_snapshot() {
        let lines = vec![
            row("2025", "State of Delaware", "All Students", "In-School Suspension", "1.0"),
            row("2019", "Other District", "All Students", "Expulsion", "lots"),
        ];
        match read(&lines) {
            Err(LoadError::Parse { line, column, .. }) => {
                assert_eq!(line, 3);
                assert_eq!(column, "PercentOfEnrollment");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn infinite_float_is_a_parse_error() {
        let line = row("2025", "State of Delaware", "All Students", "In-School Suspension", "inf");
        assert!(matches!(read(&[line]), Err(LoadError::Parse { .. })));
    }

    #[test]
    fn narrow_header_is_a_schema_error() {
        let text = "a,b,c\n1,2,3";
        match read_table(text.as_bytes(), &SnapshotFilter::default()) {
            Err(LoadError::Schema {
                line,
                expected,
                found,
            }) => {
                assert_eq!(line, 1);
                assert_eq!(expected, COLUMN_COUNT);
                assert_eq!(found, 3);
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn wide_row_is_a_schema_error() {
        let line = format!(
            "{},extra",
            row("2025", "State of Delaware", "All Students", "In-School Suspension", "1.0")
        );
        assert!(matches!(
            read(&[line]),
            Err(LoadError::Schema { line: 2, found: 19, .. })
        ));
    }

    #[test]
    fn empty_input_has_no_header() {
        let result = read_table("".as_bytes(), &SnapshotFilter::default());
        assert!(matches!(result, Err(LoadError::MissingHeader)));
    }

    #[test]
    fn header_only_file_yields_empty_table() {
        let table = read(&[]).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        writeln!(
            file,
            "{}",
            row("2025", "State of Delaware", "Hispanic/Latino", "In-School Suspension", "9.5")
        )
        .unwrap();
        file.flush().unwrap();

        let table = load_table(file.path(), &SnapshotFilter::default()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].sub_group, "Hispanic/Latino");
    }

    #[test]
    fn missing_file_is_reported_as_not_found() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("Student_Discipline.csv");
        match load_table(&path, &SnapshotFilter::default()) {
            Err(LoadError::NotFound { path: reported }) => assert_eq!(reported, path),
            other => panic!("expected not found, got {other:?}"),
        }
    }
}
