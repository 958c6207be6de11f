// Unit tests for schema reconciliation.
//
// Builds small yearly tables in a temp directory, one per header
// convention, and checks the stacked unified table: row accounting, YEAR
// stamping, canonical column names, null filling, failure kinds, and the
// checkpoint file.

use std::fs;
use std::path::Path;

use occsift::schema::renames::{LOC_Q, OCC_TITLE, O_GROUP, PRIM_ST, STATE, YEAR};
use occsift::schema::{write_checkpoint, Normalizer, CHECKPOINT_FILE};
use occsift::PipelineError;

const TEMPLATE: &str = "state_M{year}_dl.csv";

/// Oldest convention: lowercase headers, GROUP, LOC_QUOTIENT, WPCT names.
const Y2019: &str = "\
area_title,occ_title,group,loc_quotient,h_wpct10,a_wpct90,tot_emp
Texas,Electronic Assemblers,detailed,1.2,14.10,52000,3400
Ohio,Financial Analysts,detailed,0.8,30.55,150000,1200
";

/// Middle convention: uppercase, OCC_GROUP, percentiles already renamed.
const Y2020: &str = "\
AREA_TITLE,OCC_TITLE,OCC_GROUP,LOC_QUOTIENT,H_PCT10,A_PCT90,TOT_EMP,PRIM_STATE
Texas,Welders,detailed,1.5,15.00,61000,9000,TX
Texas,Electronic Assemblers,detailed,1.1,14.50,53000,3500,TX
Ohio,Cooks,detailed,,11.00,35000,,OH
";

/// Newest convention: canonical names throughout, plus ST.
const Y2021: &str = "\
STATE,OCC_TITLE,O_GROUP,LOC_Q,H_PCT10,A_PCT90,TOT_EMP,ST
Nevada,Welders,detailed,0.9,16.00,62000,800,NV
";

fn write(dir: &Path, year: i32, body: &str) {
    fs::write(dir.join(format!("state_M{year}_dl.csv")), body).unwrap();
}

fn fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), 2019, Y2019);
    write(dir.path(), 2020, Y2020);
    write(dir.path(), 2021, Y2021);
    dir
}

// ============================================================
// Stacking
// ============================================================

#[test]
fn row_count_is_sum_of_years() {
    let dir = fixture();
    let n = Normalizer::new(dir.path(), TEMPLATE);
    let per_year: usize = (2019..=2021)
        .map(|y| n.read_year(y).unwrap().len())
        .sum();
    let unified = n.normalize(2019..=2021).unwrap();
    assert_eq!(per_year, 6);
    assert_eq!(unified.len(), per_year);
}

#[test]
fn every_row_carries_its_source_year_in_order() {
    let dir = fixture();
    let unified = Normalizer::new(dir.path(), TEMPLATE)
        .normalize(2019..=2021)
        .unwrap();
    let years: Vec<Option<&str>> = unified.column_values(YEAR);
    assert_eq!(
        years,
        vec![
            Some("2019"),
            Some("2019"),
            Some("2020"),
            Some("2020"),
            Some("2020"),
            Some("2021")
        ]
    );
    // Within-year order preserved, no dedup across years
    let titles = unified.column_values(OCC_TITLE);
    assert_eq!(titles[0], Some("Electronic Assemblers"));
    assert_eq!(titles[3], Some("Electronic Assemblers"));
    assert_eq!(titles[5], Some("Welders"));
}

#[test]
fn columns_are_canonical_union_in_first_seen_order() {
    let dir = fixture();
    let unified = Normalizer::new(dir.path(), TEMPLATE)
        .normalize(2019..=2021)
        .unwrap();
    assert_eq!(
        unified.columns(),
        &[
            STATE, OCC_TITLE, O_GROUP, LOC_Q, "H_PCT10", "A_PCT90", "TOT_EMP", YEAR,
            "PRIM_STATE", PRIM_ST
        ]
    );
}

#[test]
fn renamed_fields_line_up_across_years() {
    let dir = fixture();
    let unified = Normalizer::new(dir.path(), TEMPLATE)
        .normalize(2019..=2021)
        .unwrap();
    // Each year spelled these differently; all land in one column
    assert_eq!(unified.get(0, LOC_Q), Some("1.2"));
    assert_eq!(unified.get(2, LOC_Q), Some("1.5"));
    assert_eq!(unified.get(5, LOC_Q), Some("0.9"));
    assert_eq!(unified.get(0, O_GROUP), Some("detailed"));
    assert_eq!(unified.get(5, O_GROUP), Some("detailed"));
    assert_eq!(unified.get(1, "H_PCT10"), Some("30.55"));
    assert_eq!(unified.get(0, STATE), Some("Texas"));
    assert_eq!(unified.get(5, STATE), Some("Nevada"));
}

#[test]
fn fields_absent_in_a_year_are_null() {
    let dir = fixture();
    let unified = Normalizer::new(dir.path(), TEMPLATE)
        .normalize(2019..=2021)
        .unwrap();
    assert_eq!(unified.get(0, "PRIM_STATE"), None);
    assert_eq!(unified.get(2, "PRIM_STATE"), Some("TX"));
    assert_eq!(unified.get(2, PRIM_ST), None);
    assert_eq!(unified.get(5, PRIM_ST), Some("NV"));
    // Empty cells in the source are null too
    assert_eq!(unified.get(4, LOC_Q), None);
    assert_eq!(unified.get(4, "TOT_EMP"), None);
}

#[test]
fn single_year_range() {
    let dir = fixture();
    let unified = Normalizer::new(dir.path(), TEMPLATE)
        .normalize(2021..=2021)
        .unwrap();
    assert_eq!(unified.len(), 1);
    assert_eq!(unified.get(0, YEAR), Some("2021"));
}

// ============================================================
// Failure kinds
// ============================================================

#[test]
fn missing_year_aborts_with_missing_input() {
    let dir = fixture();
    let err = Normalizer::new(dir.path(), TEMPLATE)
        .normalize(2019..=2022)
        .unwrap_err();
    match err {
        PipelineError::MissingInput { year, path } => {
            assert_eq!(year, 2022);
            assert!(path.ends_with("state_M2022_dl.csv"));
        }
        other => panic!("expected MissingInput, got {other}"),
    }
}

#[test]
fn missing_required_column_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), 2019, "AREA_TITLE,TOT_EMP\nTexas,5\n");
    let err = Normalizer::new(dir.path(), TEMPLATE)
        .read_year(2019)
        .unwrap_err();
    assert!(matches!(err, PipelineError::MalformedInput { .. }), "{err}");
    assert!(err.to_string().contains("OCC_TITLE"));
}

#[test]
fn ragged_row_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), 2019, "STATE,OCC_TITLE\nTexas,Welders,extra\n");
    let err = Normalizer::new(dir.path(), TEMPLATE)
        .read_year(2019)
        .unwrap_err();
    assert!(matches!(err, PipelineError::MalformedInput { .. }), "{err}");
}

#[test]
fn two_raw_names_for_one_canonical_column_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        2019,
        "STATE,OCC_TITLE,GROUP,OCC_GROUP\nTexas,Welders,major,detailed\n",
    );
    let err = Normalizer::new(dir.path(), TEMPLATE)
        .read_year(2019)
        .unwrap_err();
    assert!(matches!(err, PipelineError::MalformedInput { .. }), "{err}");
}

#[test]
fn empty_file_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), 2019, "");
    let err = Normalizer::new(dir.path(), TEMPLATE)
        .read_year(2019)
        .unwrap_err();
    assert!(matches!(err, PipelineError::MalformedInput { .. }), "{err}");
}

#[test]
fn reversed_range_is_invalid_config() {
    let dir = fixture();
    let err = Normalizer::new(dir.path(), TEMPLATE)
        .normalize(2021..=2019)
        .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidConfig(_)));
}

// ============================================================
// Header and cell handling
// ============================================================

#[test]
fn bom_and_padded_headers_are_cleaned() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        2019,
        "\u{feff}area_title , occ_title\nTexas,Welders\n",
    );
    let table = Normalizer::new(dir.path(), TEMPLATE)
        .read_year(2019)
        .unwrap();
    assert_eq!(table.columns(), &[STATE, OCC_TITLE, YEAR]);
}

#[test]
fn existing_year_column_is_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), 2019, "STATE,OCC_TITLE,year\nTexas,Welders,1999\n");
    let table = Normalizer::new(dir.path(), TEMPLATE)
        .read_year(2019)
        .unwrap();
    assert_eq!(table.columns(), &[STATE, OCC_TITLE, YEAR]);
    assert_eq!(table.get(0, YEAR), Some("2019"));
}

#[test]
fn latin1_cells_are_decoded() {
    let dir = tempfile::tempdir().unwrap();
    let mut body = b"STATE,OCC_TITLE\nPuerto Rico,Cajeros de ba".to_vec();
    body.push(0xF1); // n with tilde in Latin-1
    body.extend_from_slice(b"o\n");
    fs::write(dir.path().join("state_M2019_dl.csv"), body).unwrap();

    let table = Normalizer::new(dir.path(), TEMPLATE)
        .read_year(2019)
        .unwrap();
    assert_eq!(table.get(0, OCC_TITLE), Some("Cajeros de baño"));
}

#[test]
fn tab_delimited_input() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("oes19.tsv"),
        "STATE\tOCC_TITLE\nTexas\tWelders, Cutters\n",
    )
    .unwrap();
    let table = Normalizer::new(dir.path(), "oes{yy}.tsv")
        .with_delimiter(b'\t')
        .read_year(2019)
        .unwrap();
    assert_eq!(table.get(0, OCC_TITLE), Some("Welders, Cutters"));
}

// ============================================================
// Checkpoint
// ============================================================

#[test]
fn checkpoint_is_reproducible_byte_for_byte() {
    let dir = fixture();
    let out_a = tempfile::tempdir().unwrap();
    let out_b = tempfile::tempdir().unwrap();
    let n = Normalizer::new(dir.path(), TEMPLATE);

    let a = write_checkpoint(&n.normalize(2019..=2021).unwrap(), out_a.path(), b',').unwrap();
    let b = write_checkpoint(&n.normalize(2019..=2021).unwrap(), out_b.path(), b',').unwrap();

    assert!(a.ends_with(CHECKPOINT_FILE));
    assert_eq!(fs::read(&a).unwrap(), fs::read(&b).unwrap());
}

#[test]
fn checkpoint_content() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), 2019, "area_title,occ_title\nTexas,Welders\n");
    write(dir.path(), 2020, "STATE,OCC_TITLE,LOC_Q\nOhio,\"Cooks, Restaurant\",1.1\n");
    let out = tempfile::tempdir().unwrap();

    let table = Normalizer::new(dir.path(), TEMPLATE)
        .normalize(2019..=2020)
        .unwrap();
    let path = write_checkpoint(&table, out.path(), b',').unwrap();

    assert_eq!(
        fs::read_to_string(path).unwrap(),
        "STATE,OCC_TITLE,YEAR,LOC_Q\n\
         Texas,Welders,2019,\n\
         Ohio,\"Cooks, Restaurant\",2020,1.1\n"
    );
}
