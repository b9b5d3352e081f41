use cis_recon::jobs::{CONTROL_TABLE, OwnerJob, accounts};
use cis_recon::{JobContext, ReconError, all_jobs, job_from_name, run_job};

use crate::utils::{Workspace, column_values, date, ints, strings, table, texts};

#[test]
fn test_program_names_resolve_to_jobs() {
    for (program, job) in [
        ("CCRCCRLN", "relationship"),
        ("ccrccrl1", "parties"),
        ("ccrnidic", "identity"),
        ("ccrtax3b", "taxid"),
        ("ccrowner", "owner"),
        ("ccrsadr4", "address"),
        ("ccrsaddp", "deposit_address"),
        ("cicmdrpt", "accounts"),
        ("CICMDRPT2", "customer_report"),
        ("ciciscom", "customer_combine"),
        ("ccrnmx3b", "customer_name"),
    ] {
        assert_eq!(job_from_name(program).unwrap().name(), job);
    }
    assert!(matches!(job_from_name("nope"), Err(ReconError::UnknownJob(_))));
    assert_eq!(all_jobs().len(), 11);
}

#[test]
fn test_every_job_declares_inputs() {
    for job in all_jobs() {
        assert!(!job.inputs().is_empty(), "{} has no inputs", job.name());
        assert!(!job.description().is_empty());
    }
}

#[test]
fn test_control_date_is_read_from_the_control_extract() {
    let ws = Workspace::new();
    ws.add_input(
        CONTROL_TABLE,
        &table(
            CONTROL_TABLE,
            vec![("SRSYY", texts(&["2024"])), ("SRSMM", texts(&["3"])), ("SRSDD", texts(&["15"]))],
        ),
    );
    let ctx = JobContext::new(&ws.config).unwrap();
    assert_eq!(ctx.control_date, date(2024, 3, 15));

    let mut config = ws.config.clone();
    config.control_date = Some(date(2025, 1, 31));
    assert_eq!(JobContext::new(&config).unwrap().control_date, date(2025, 1, 31));
}

#[test]
fn test_owner_job_end_to_end() {
    let ws = Workspace::new();
    let accounts = |name: &str, acct: &str, cust: &str, prisec: &str| {
        table(
            name,
            vec![
                ("ACCTNOC", texts(&[acct])),
                ("CUSTNO", texts(&[cust])),
                ("RLENCODE", texts(&["020"])),
                ("PRISEC", texts(&[prisec])),
            ],
        )
    };
    ws.add_input("DP", &accounts("DP", "3000000001", "1", "901"));
    ws.add_input("CISDEMO_SAFD", &accounts("CISDEMO_SAFD", "4000000001", "1", "902"));
    ws.add_input("CISDEMO_LN", &accounts("CISDEMO_LN", "2000000001", "2", "901"));
    ws.add_input(
        "CISRLCC",
        &table(
            "CISRLCC",
            vec![
                ("CUST1", texts(&["9", "9", "8"])),
                ("CODE1", texts(&["050", "050", "051"])),
                ("CUST2", texts(&["1", "1", "2"])),
                ("CODE2", texts(&["060", "060", "061"])),
            ],
        ),
    );
    let ctx = JobContext::with_control_date(&ws.config, date(2024, 6, 30));
    let report = run_job(&OwnerJob, &ctx).unwrap();
    assert_eq!(report.rows("CISOWNER.parquet"), Some(2));

    let owners = cis_recon::read_parquet("CISOWNER", &ws.output("CISOWNER.parquet"), None, 1024).unwrap();
    assert_eq!(column_values(&owners, "ACCTCODE"), vec![Some("LN".into()), Some("DP".into())]);
    assert_eq!(
        column_values(&owners, "CUST2"),
        vec![Some("00000000008".into()), Some("00000000009".into())]
    );
    assert_eq!(column_values(&owners, "CODE1"), vec![Some("061".into()), Some("060".into())]);
}

#[test]
fn test_account_summary_job_end_to_end() {
    let ws = Workspace::new();
    let one = |v: &str| texts(&[v]);
    ws.add_input(
        accounts::BALANCES,
        &table(
            accounts::BALANCES,
            vec![
                ("REPTNO", ints(&[Some(1001)])),
                ("FMTCODE", ints(&[Some(10)])),
                ("ACCTNO", one("1050000000")),
                ("ACCTBRCH1", one("7")),
                ("PRODTYPE", one("351")),
                ("COSTCTR", ints(&[Some(3100)])),
                ("LEDGERBAL1", ints(&[Some(-250)])),
                ("ACCTNAME", one("SYARIKAT ABC")),
                ("PURPOSECD", one("P1")),
                ("OPENDATE", one("20230115000000")),
                ("CLSEDATE", strings(&[None])),
                ("OPENIND", one("")),
                ("BALHOLD", one("0")),
                ("CURBAL", one("0")),
                ("ODLIMIT", one("0")),
                ("CURRCODE", one("USD")),
                ("POSTIND", one("")),
            ],
        ),
    );
    ws.add_input(
        accounts::BRANCHES,
        &table(accounts::BRANCHES, vec![("ACCTBRCH", one("007")), ("BRANCH_ABBR", one("MLK"))]),
    );
    let ctx = JobContext::with_control_date(&ws.config, date(2024, 6, 30));
    let report = run_job(&accounts::AccountSummaryJob, &ctx).unwrap();
    assert_eq!(report.rows("ACCTSUMM.csv"), Some(1));

    let csv = ws.read_output("ACCTSUMM.csv");
    let mut lines = csv.lines();
    let header = lines.next().unwrap().split(',').collect::<Vec<_>>();
    let row = lines.next().unwrap().split(',').collect::<Vec<_>>();
    let field = |name: &str| row[header.iter().position(|h| *h == name).unwrap()];
    assert_eq!(field("ACCTNOC"), "01050000000");
    assert_eq!(field("ACCTBRCH"), "007");
    assert_eq!(field("BRANCH_ABBR"), "MLK");
    assert_eq!(field("APPL_CODE"), "FCYFD");
    assert_eq!(field("BANKINDC"), "I");
    assert_eq!(field("LEDGERBAL"), "-2.5");
    assert_eq!(field("ACCTSTATUS"), "ACTIVE");
    assert_eq!(field("DATEOPEN"), "20230115");
    assert_eq!(field("DATECLSE"), "");
}
