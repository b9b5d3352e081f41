use cis_recon::dedup::{Retention, dedup_with_diff, unique};
use cis_recon::jobs::relationship::RELATIONSHIP_KEY;

use crate::utils::{column_values, ints, sorted_rows, strings, table, texts};

fn relationships() -> cis_recon::Table {
    table(
        "RLNSHIP",
        vec![
            ("CUSTNO1", texts(&["00000000001", "00000000001", "00000000002", "00000000001", "00000000003"])),
            ("CUSTNO2", texts(&["00000000009", "00000000009", "00000000009", "00000000009", "00000000001"])),
            ("CODE1", ints(&[Some(10), Some(10), Some(10), Some(11), Some(10)])),
            ("CODE2", ints(&[Some(20), Some(20), Some(20), Some(20), Some(20)])),
            ("CUSTNAME1", strings(&[Some("ALI"), Some("ALI BIN ABU"), Some("ABU"), Some("ALI"), None])),
        ],
    )
}

#[test]
fn test_unique_and_duplicates_partition_the_input() {
    let input = relationships();
    let outcome = dedup_with_diff(&input, &RELATIONSHIP_KEY, &Retention::First).unwrap();

    assert_eq!(outcome.unique.num_rows() + outcome.duplicates.num_rows(), input.num_rows());

    let mut recombined = sorted_rows(&outcome.unique);
    recombined.extend(sorted_rows(&outcome.duplicates));
    recombined.sort();
    assert_eq!(recombined, sorted_rows(&input));
}

#[test]
fn test_first_occurrence_is_kept() {
    let outcome = dedup_with_diff(&relationships(), &RELATIONSHIP_KEY, &Retention::First).unwrap();

    assert_eq!(outcome.unique.num_rows(), 4);
    assert_eq!(
        column_values(&outcome.unique, "CUSTNAME1"),
        vec![Some("ALI".into()), Some("ABU".into()), Some("ALI".into()), None]
    );
    assert_eq!(outcome.duplicates.num_rows(), 1);
    assert_eq!(column_values(&outcome.duplicates, "CUSTNAME1"), vec![Some("ALI BIN ABU".into())]);
}

#[test]
fn test_unique_is_idempotent() {
    let once = unique(&relationships(), &RELATIONSHIP_KEY, &Retention::First).unwrap();
    let twice = unique(&once, &RELATIONSHIP_KEY, &Retention::First).unwrap();
    assert_eq!(sorted_rows(&once), sorted_rows(&twice));
}

#[test]
fn test_identical_rows_collapse_on_all_columns() {
    let input = table(
        "CISOWNER",
        vec![
            ("ACCTNOC", texts(&["03000000001", "03000000001", "03000000002"])),
            ("CUSTNO", texts(&["00000000001", "00000000001", "00000000001"])),
        ],
    );
    let kept = unique(&input, &[], &Retention::First).unwrap();
    assert_eq!(kept.num_rows(), 2);
    assert_eq!(
        column_values(&kept, "ACCTNOC"),
        vec![Some("03000000001".into()), Some("03000000002".into())]
    );
}

#[test]
fn test_null_keys_form_one_group() {
    let input = table(
        "ALIAS",
        vec![
            ("CUSTNO", strings(&[None, Some("00000000001"), None])),
            ("ALIAS", texts(&["A", "B", "C"])),
        ],
    );
    let kept = unique(&input, &["CUSTNO"], &Retention::First).unwrap();
    assert_eq!(column_values(&kept, "ALIAS"), vec![Some("A".into()), Some("B".into())]);
}

#[test]
fn test_retention_last_and_latest() {
    let input = table(
        "NAMES",
        vec![
            ("CUSTNO", texts(&["1", "1", "1", "2"])),
            ("EFFDATE", ints(&[Some(20200101), Some(20230101), Some(20230101), Some(20190101)])),
            ("NAME", texts(&["OLD", "NEW", "NEWER", "ONLY"])),
        ],
    );

    let last = unique(&input, &["CUSTNO"], &Retention::Last).unwrap();
    assert_eq!(column_values(&last, "NAME"), vec![Some("NEWER".into()), Some("ONLY".into())]);

    // Ties on the ordering column keep the earlier row
    let latest = unique(&input, &["CUSTNO"], &Retention::LatestBy(vec!["EFFDATE".to_string()])).unwrap();
    assert_eq!(column_values(&latest, "NAME"), vec![Some("NEW".into()), Some("ONLY".into())]);
}

#[test]
fn test_missing_key_column_is_an_error() {
    assert!(unique(&relationships(), &["NOPE"], &Retention::First).is_err());
}
