use crate::config::ALL_STUDENTS;
use crate::models::{FilteredTable, OutputRecord};

/// External category label → SubGroup value in the data.
const CATEGORY_MAPPING: &[(&str, &str)] = &[
    ("Black", "African American"),
    ("Hispanic", "Hispanic/Latino"),
    ("Students with Disabilities", "Students with Disabilities"),
    ("Low-income students", "Low Income"),
    (ALL_STUDENTS, ALL_STUDENTS),
];

/// Exact, case-sensitive lookup. Unknown labels have no subgroup.
pub fn subgroup_for(category: &str) -> Option<&'static str> {
    CATEGORY_MAPPING
        .iter()
        .find(|(label, _)| *label == category)
        .map(|(_, sub_group)| *sub_group)
}

pub fn categories() -> impl Iterator<Item = &'static str> {
    CATEGORY_MAPPING.iter().map(|(label, _)| *label)
}

pub fn select(table: &FilteredTable, category: &str) -> Vec<OutputRecord> {
    let Some(sub_group) = subgroup_for(category) else {
        return Vec::new();
    };

    let mut records: Vec<OutputRecord> = table
        .rows()
        .iter()
        .filter(|row| row.sub_group == sub_group)
        .map(OutputRecord::from)
        .collect();

    // Stable, so equal names keep their table order.
    records.sort_by(|a, b| a.name.cmp(&b.name));
    records
}
