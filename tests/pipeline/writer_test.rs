use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array};
use cis_recon::reader::read_parquet;
use cis_recon::writer::{DelimitedOptions, FieldSpec, FixedWidthLayout, OutputSet, write_delimited};
use cis_recon::{Expr, PipelineConfig, Table};

use crate::utils::{Workspace, column_values, strings, table, texts};

fn parties() -> Table {
    table(
        "PARTIES",
        vec![
            ("CUSTNO", texts(&["00000000001", "00000000002"])),
            ("CUSTNAME", strings(&[Some("TAN, AH KOW"), None])),
            ("ACCTCODE", strings(&[Some("DP"), Some("LN")])),
        ],
    )
}

#[test]
fn test_output_set_writes_configured_formats() {
    let ws = Workspace::new();
    let mut outputs = OutputSet::new(&ws.config);
    outputs.write(&parties(), "PARTIES").unwrap();
    let written = outputs.finish();

    assert_eq!(written.len(), 2);
    assert!(written.iter().all(|o| o.rows == 2));
    assert_eq!(
        ws.read_output("PARTIES.csv"),
        "CUSTNO,CUSTNAME,ACCTCODE\n00000000001,\"TAN, AH KOW\",DP\n00000000002,,LN\n"
    );

    let back = read_parquet("PARTIES", &ws.output("PARTIES.parquet"), None, 1024).unwrap();
    assert_eq!(column_values(&back, "CUSTNAME"), column_values(&parties(), "CUSTNAME"));
    assert!(!ws.has_temp_files());
}

#[test]
fn test_csv_can_be_disabled() {
    let ws = Workspace::new();
    let config = PipelineConfig {
        write_csv: false,
        ..ws.config.clone()
    };
    let mut outputs = OutputSet::new(&config);
    outputs.write(&parties(), "PARTIES").unwrap();
    assert_eq!(outputs.written().len(), 1);
    assert!(!ws.output("PARTIES.csv").exists());
    assert!(ws.output("PARTIES.parquet").exists());
}

#[test]
fn test_null_marker_and_quoting() {
    let ws = Workspace::new();
    let path = ws.output("IMIS.csv");
    write_delimited(&parties(), &path, &DelimitedOptions::quoted_with_null_marker()).unwrap();
    assert_eq!(
        ws.read_output("IMIS.csv"),
        "\"CUSTNO\",\"CUSTNAME\",\"ACCTCODE\"\n\"00000000001\",\"TAN, AH KOW\",\"DP\"\n\"00000000002\",\\N,\"LN\"\n"
    );
}

#[test]
fn test_float_precision() {
    let ws = Workspace::new();
    let balances = Table::from_columns(
        "ACCTSUMM",
        vec![
            ("ACCTNOC".to_string(), texts(&["03000000001"])),
            ("LEDGERBAL".to_string(), Arc::new(Float64Array::from(vec![123.4])) as ArrayRef),
        ],
    )
    .unwrap();
    let options = DelimitedOptions {
        delimiter: b'|',
        header: false,
        float_precision: Some(2),
        ..DelimitedOptions::default()
    };
    write_delimited(&balances, &ws.output("ACCTSUMM.txt"), &options).unwrap();
    assert_eq!(ws.read_output("ACCTSUMM.txt"), "03000000001|123.40\n");
}

#[test]
fn test_fixed_width_records() {
    let ws = Workspace::new();
    let layout = FixedWidthLayout::new(vec![
        FieldSpec::column("CUSTNO", 11),
        FieldSpec::literal("*"),
        FieldSpec::column("CUSTNAME", 8).uppercase(),
        FieldSpec::column("ACCTCODE", 4).right(),
    ])
    .skip_when(Expr::eq_str("ACCTCODE", "LN"));
    let mut outputs = OutputSet::new(&ws.config);
    outputs.fixed_width(&parties(), "PARTIES.txt", &layout).unwrap();

    assert_eq!(outputs.written()[0].rows, 1);
    assert_eq!(ws.read_output("PARTIES.txt"), "00000000001*TAN, AH   DP\n");
    assert_eq!(layout.record_width(), 24);
}

#[test]
fn test_failed_write_leaves_no_partial_file() {
    let ws = Workspace::new();
    let layout = FixedWidthLayout::new(vec![FieldSpec::column("MISSING", 5)]);
    let mut outputs = OutputSet::new(&ws.config);
    assert!(outputs.fixed_width(&parties(), "BAD.txt", &layout).is_err());
    assert!(!ws.output("BAD.txt").exists());
    assert!(!ws.has_temp_files());
}
