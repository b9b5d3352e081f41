use cis_recon::classify::tables::FCY_CA_PRODUCTS;
use cis_recon::classify::{Output, RangeTable, RuleSet, account_type_ranges, add_match_columns, zip_state_ranges};
use cis_recon::filter::Expr;

use crate::utils::{column_values, ints, strings, table, texts};

#[test]
fn test_range_bounds_are_inclusive() {
    let ranges = RangeTable::new("T", &[(100, 199, "LOW"), (200, 299, "HIGH")]).unwrap();
    assert_eq!(ranges.lookup(100), Some("LOW"));
    assert_eq!(ranges.lookup(199), Some("LOW"));
    assert_eq!(ranges.lookup(200), Some("HIGH"));
    assert_eq!(ranges.lookup(300), None);
    assert_eq!(ranges.classify(" 150 "), Some("LOW"));
    assert_eq!(ranges.classify("15A"), None);
    assert_eq!(ranges.classify(""), None);
}

#[test]
fn test_account_ranges_with_fallback() {
    let accounts = table(
        "DPTRBALS",
        vec![
            ("ACCTNOC", strings(&[Some("03100000000"), Some("07000000001"), Some("09999999999"), None])),
            ("APPL_CODE", strings(&[None, Some("XX"), Some("YY"), Some("ZZ")])),
        ],
    );
    let classified = account_type_ranges()
        .unwrap()
        .classify_column(&accounts, "ACCTNOC", "APPL_CODE", Some("APPL_CODE"))
        .unwrap();
    assert_eq!(
        column_values(&classified, "APPL_CODE"),
        vec![Some("CA".into()), Some("FD".into()), Some("YY".into()), Some("ZZ".into())]
    );
}

#[test]
fn test_postcode_states() {
    let addresses = table("ADDR", vec![("NEW_ZIP", strings(&[Some("50450"), Some("88000"), Some("00500"), None]))]);
    let states = zip_state_ranges()
        .unwrap()
        .classify_column(&addresses, "NEW_ZIP", "ZIP_STATE", None)
        .unwrap();
    assert_eq!(
        column_values(&states, "ZIP_STATE"),
        vec![Some("W P".into()), Some("SAB".into()), None, None]
    );
}

#[test]
fn test_rule_order_decides_overlaps() {
    let accounts = table("DPTRBALS", vec![("PRODTY", texts(&["401", "010", "371"]))]);
    let rules = RuleSet::new("APPL_CODE")
        .when(Expr::in_strs("PRODTY", FCY_CA_PRODUCTS), Output::lit("FCYCA"))
        .when(Expr::StartsWith("PRODTY".into(), "4".into()), Output::lit("NEVER"))
        .otherwise(Output::lit("SA"));
    let classified = rules.apply(&accounts, "APPL_CODE").unwrap();
    assert_eq!(
        column_values(&classified, "APPL_CODE"),
        vec![Some("FCYCA".into()), Some("SA".into()), Some("SA".into())]
    );
}

#[test]
fn test_rules_treat_null_conditions_as_unmatched() {
    let relationships = table("CIS", vec![("INDORG", strings(&[Some("O"), None, Some("I")])), ("NEWIC", texts(&["123", "456", "789"]))]);
    let busreg = RuleSet::new("BUSREG")
        .when(Expr::eq_str("INDORG", "O"), Output::col("NEWIC"))
        .apply(&relationships, "BUSREG")
        .unwrap();
    assert_eq!(column_values(&busreg, "BUSREG"), vec![Some("123".into()), None, None]);
}

#[test]
fn test_match_columns_from_left_join_flags() {
    let taxid = table(
        "TAXID",
        vec![
            ("C", strings(&[Some("1"), Some("1"), None, None])),
            ("F", ints(&[Some(1), None, Some(1), None])),
        ],
    );
    let out = add_match_columns(&taxid, "C", "F").unwrap();
    assert_eq!(
        column_values(&out, "MATCHID"),
        vec![Some("B".into()), Some("N".into()), Some("O".into()), Some("X".into())]
    );
    assert_eq!(
        column_values(&out, "RHOLD_IND"),
        vec![Some("Y".into()), Some("Y".into()), Some("Y".into()), Some("N".into())]
    );
}
