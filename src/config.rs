use clap::Args;

use crate::models::DisciplineRecord;

pub const ALL_STUDENTS: &str = "All Students";
pub const DEFAULT_DISTRICT: &str = "State of Delaware";
pub const DEFAULT_SCHOOL_YEAR: i64 = 2025;
pub const DEFAULT_CATEGORY: &str = "In-School Suspension";

/// The point-in-time slice every loaded row must match.
#[derive(Debug, Clone, PartialEq, Args)]
pub struct SnapshotFilter {
    /// District name to keep
    #[arg(long, env = "DISCIPLINE_DISTRICT", default_value = DEFAULT_DISTRICT)]
    pub district: String,
    /// School year to keep
    #[arg(long, env = "DISCIPLINE_SCHOOL_YEAR", default_value_t = DEFAULT_SCHOOL_YEAR)]
    pub school_year: i64,
    /// Gender value to keep
    #[arg(long, env = "DISCIPLINE_GENDER", default_value = ALL_STUDENTS)]
    pub gender: String,
    /// Grade value to keep
    #[arg(long, env = "DISCIPLINE_GRADE", default_value = ALL_STUDENTS)]
    pub grade: String,
    /// Discipline category to keep
    #[arg(long, env = "DISCIPLINE_CATEGORY", default_value = DEFAULT_CATEGORY)]
    pub category: String,
}

impl Default for SnapshotFilter {
    fn default() -> Self {
        Self {
            district: DEFAULT_DISTRICT.to_string(),
            school_year: DEFAULT_SCHOOL_YEAR,
            gender: ALL_STUDENTS.to_string(),
            grade: ALL_STUDENTS.to_string(),
            category: DEFAULT_CATEGORY.to_string(),
        }
    }
}

impl SnapshotFilter {
    pub fn matches(&self, record: &DisciplineRecord) -> bool {
        record.district_name == self.district
            && record.school_year == self.school_year
            && record.gender == self.gender
            && record.grade == self.grade
            && record.category == self.category
    }
}
