//! School field contract

/// Source field → destination column
pub const FIELD_MAPPING: &[(&str, &str)] = &[
    ("NCESSCH", "school_id"),
    ("SURVYEAR", "survey_year"),
    ("STABR", "state_code"),
    ("LEA_NAME", "agency_name"),
    ("SCH_NAME", "school_name"),
    ("LSTREET1", "street"),
    ("LCITY", "city"),
    ("VIRTUAL", "virtual_school"),
    ("SCHOOL_LEVEL", "school_level"),
    ("TOTAL", "total_students_all_grades"),
    ("AM", "ai_an_total"),
    ("AS_", "asian_total"),
    ("BL", "black_total"),
    ("HP", "hawaiian_pacific_islander_total"),
    ("HI", "hispanic_total"),
    ("TR", "two_or_more_races_total"),
    ("WH", "white_total"),
];

/// Destination columns coerced to whole numbers
pub const NUMERIC_COLUMNS: [&str; 9] = [
    "school_id",
    "total_students_all_grades",
    "ai_an_total",
    "asian_total",
    "black_total",
    "hawaiian_pacific_islander_total",
    "hispanic_total",
    "two_or_more_races_total",
    "white_total",
];

/// Source field names, in table order
pub fn source_fields() -> Vec<&'static str> {
    FIELD_MAPPING.iter().map(|(source, _)| *source).collect()
}

/// Destination column names, in table order
pub fn destination_columns() -> Vec<&'static str> {
    FIELD_MAPPING.iter().map(|(_, dest)| *dest).collect()
}
