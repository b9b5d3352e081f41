use cis_recon::jobs::AddressJob;
use cis_recon::jobs::address::{ADDRESSES, ELEMENTS, UPDATE_FILE, VERIFY_FILE, corrected_addresses};
use cis_recon::{JobContext, run_job};

use crate::utils::{Workspace, column_values, date, strings, table, texts};

fn add_fixtures(ws: &Workspace) {
    ws.add_input(
        ADDRESSES,
        &table(
            ADDRESSES,
            vec![
                ("ADDREF1", texts(&["1", "2", "3", "4"])),
                ("CUSTNO", texts(&["77", "78", "79", "80"])),
                ("LINE1ADR", texts(&["NO 1 JALAN AMPANG", "1 ORCHARD RD", "LOT 5", "12 JALAN SS2"])),
                (
                    "LINE2ADR",
                    strings(&[Some("50450 kuala lumpur"), Some("238801 SINGAPORE"), Some("TAMAN JAYA"), Some("47300 PJ")]),
                ),
                ("LINE3ADR", strings(&[None, None, None, Some("88000 KOTA KINABALU")])),
                ("LINE4ADR", strings(&[None, None, None, None])),
                ("LINE5ADR", strings(&[None, None, None, None])),
            ],
        ),
    );
    ws.add_input(
        ELEMENTS,
        &table(
            ELEMENTS,
            vec![
                ("ADDREF1", texts(&["1", "2", "3", "4"])),
                ("STREET", texts(&["", "", "", ""])),
                ("CITY", texts(&["KL", "SG", "JAYA", "PJ"])),
                ("ZIP", texts(&["", "", "", "47300"])),
                ("ZIP2", texts(&["", "", "", ""])),
                ("COUNTRY", texts(&["MALAYSIA  ", "SINGAPORE ", "MALAYSIA  ", "MALAYSIA  "])),
                ("STATEX", strings(&[None, None, None, Some("SEL")])),
            ],
        ),
    );
}

#[test]
fn test_corrected_addresses() {
    let ws = Workspace::new();
    add_fixtures(&ws);
    let ctx = JobContext::with_control_date(&ws.config, date(2024, 6, 30));
    let [addresses, elements] = ctx
        .load_many([cis_recon::InputSpec::all(ADDRESSES), cis_recon::InputSpec::all(ELEMENTS)])
        .unwrap();

    let local = corrected_addresses(&ctx, &addresses, &elements).unwrap();
    // The Singapore address is excluded by its country code
    assert_eq!(
        column_values(&local, "CUSTNO"),
        vec![Some("00000000077".into()), Some("00000000079".into()), Some("00000000080".into())]
    );
    assert_eq!(
        column_values(&local, "NEW_ZIP"),
        vec![Some("50450".into()), None, Some("88000".into())]
    );
    // A known state is kept; a missing one comes from the postcode
    assert_eq!(column_values(&local, "STATEX"), vec![Some("W P".into()), Some(String::new()), Some("SEL".into())]);
}

#[test]
fn test_address_job_end_to_end() {
    let ws = Workspace::new();
    add_fixtures(&ws);
    let ctx = JobContext::with_control_date(&ws.config, date(2024, 6, 30));

    let report = run_job(&AddressJob, &ctx).unwrap();
    assert_eq!(report.rows(UPDATE_FILE), Some(2));
    assert_eq!(report.rows(VERIFY_FILE), Some(2));

    let expected = format!(
        "{:<11}{:<11}{:<25}{:<3}{:<5}{:<10}\n{:<11}{:<11}{:<25}{:<3}{:<5}{:<10}\n",
        "00000000077",
        "00000000001",
        "KUALA LUMPUR",
        "W P",
        "50450",
        "MALAYSIA",
        "00000000080",
        "00000000004",
        "KOTA KINABALU",
        "SEL",
        "88000",
        "MALAYSIA"
    );
    assert_eq!(ws.read_output(UPDATE_FILE), expected);

    let verify = ws.read_output(VERIFY_FILE);
    let lines = verify.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("CIS #"));
    assert!(lines[1].starts_with("00000000077-00000000001NO 1 JALAN AMPANG"));
    assert!(lines[1].contains("*NEW*50450kuala lumpur"));
}
