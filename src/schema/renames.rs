// Historical column renames.
//
// The wage tables have been published under several header conventions.
// Older vintages use names that were later changed; every alternate name
// here maps onto the name used by the most recent vintages. Supporting a
// new vintage means adding rows to RENAMES, nothing else.

/// Canonical name of the area column the state filter matches on.
pub const STATE: &str = "STATE";
/// Canonical name of the occupation title column.
pub const OCC_TITLE: &str = "OCC_TITLE";
/// Canonical name of the occupation group column.
pub const O_GROUP: &str = "O_GROUP";
/// Canonical name of the location quotient column.
pub const LOC_Q: &str = "LOC_Q";
/// Canonical name of the primary state abbreviation column.
pub const PRIM_ST: &str = "PRIM_ST";
/// Source vintage stamped onto every row at ingestion.
pub const YEAR: &str = "YEAR";

/// Columns every vintage must provide once renamed.
pub const REQUIRED: [&str; 2] = [OCC_TITLE, STATE];

/// (historical name, canonical name). Keys are uppercase.
pub const RENAMES: &[(&str, &str)] = &[
    ("AREA_TITLE", STATE),
    ("LOC_QUOTIENT", LOC_Q),
    ("H_WPCT10", "H_PCT10"),
    ("H_WPCT25", "H_PCT25"),
    ("H_WPCT75", "H_PCT75"),
    ("H_WPCT90", "H_PCT90"),
    ("A_WPCT10", "A_PCT10"),
    ("A_WPCT25", "A_PCT25"),
    ("A_WPCT75", "A_PCT75"),
    ("A_WPCT90", "A_PCT90"),
    ("GROUP", O_GROUP),
    ("OCC_GROUP", O_GROUP),
    ("ST", PRIM_ST),
];

/// Map a raw header to its canonical name.
///
/// Comparison is case-insensitive; the result is always uppercase. Names
/// not in the table pass through uppercased.
pub fn canonical_name(raw: &str) -> String {
    let upper = raw.trim().trim_start_matches('\u{feff}').to_uppercase();
    RENAMES
        .iter()
        .find(|(old, _)| *old == upper)
        .map(|(_, new)| (*new).to_string())
        .unwrap_or(upper)
}
