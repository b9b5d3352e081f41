use cis_recon::jobs::relationship::{ALIASES, CODES, CUSTOMERS, NAMES, RELATIONSHIPS, active_relationships};
use cis_recon::reader::read_parquet;
use cis_recon::{Job, JobContext, run_job};
use cis_recon::jobs::RelationshipJob;

use crate::utils::{Workspace, column_values, date, strings, table, texts};

fn add_fixtures(ws: &Workspace) {
    ws.add_input(
        RELATIONSHIPS,
        &table(
            RELATIONSHIPS,
            vec![
                ("CUSTNO", texts(&["1", "1", "3", "4"])),
                ("EFFDATE", texts(&["20200101", "20210101", "20200101", "20220101"])),
                ("CUSTNO2", texts(&["2", "2", "1", "5"])),
                ("CODE1", texts(&["10", "10", "10", "10"])),
                ("CODE2", texts(&["20", "20", "20", "20"])),
                ("EXPIRE_DATE", strings(&[Some(" "), Some(""), Some("2001-01-01"), Some("2099-12-31")])),
            ],
        ),
    );
    ws.add_input(
        CODES,
        &table(
            CODES,
            vec![
                ("RLENTYPE", texts(&["CC", "CC"])),
                ("RLENCODE", texts(&["10", "20"])),
                ("RLENDESC", texts(&["FATHER", "SON"])),
            ],
        ),
    );
    ws.add_input(
        NAMES,
        &table(
            NAMES,
            vec![
                ("CUSTNO", texts(&["1", "2"])),
                ("INDORG", texts(&["I", "I"])),
                ("CUSTNAME", texts(&["ALI", "ABU"])),
            ],
        ),
    );
    ws.add_input(
        ALIASES,
        &table(ALIASES, vec![("CUSTNO", texts(&["00000000001"])), ("NAME_LINE", texts(&["ALI BIN ABU"]))]),
    );
    ws.add_input(
        CUSTOMERS,
        &table(
            CUSTOMERS,
            vec![
                ("CUSTNO", texts(&["1", "2", "4"])),
                ("TAXID", texts(&["A1", "A2", "A4"])),
                ("BASICGRPCODE", texts(&["G1", "G2", "G4"])),
            ],
        ),
    );
}

#[test]
fn test_expired_relationships_are_dropped() {
    let ws = Workspace::new();
    add_fixtures(&ws);
    let ctx = JobContext::with_control_date(&ws.config, date(2024, 6, 30));
    let raw = ctx.load(cis_recon::InputSpec::all(RELATIONSHIPS)).unwrap();

    let active = active_relationships(&ctx, &raw).unwrap();
    assert_eq!(
        column_values(&active, "CUSTNO1"),
        vec![Some("00000000001".into()), Some("00000000001".into()), Some("00000000004".into())]
    );
    assert_eq!(column_values(&active, "CUSTNO2")[2], Some("00000000005".into()));
    assert_eq!(column_values(&active, "EXPDATE"), vec![None, None, Some("2099-12-31".into())]);
}

#[test]
fn test_relationship_job_end_to_end() {
    let ws = Workspace::new();
    add_fixtures(&ws);
    let ctx = JobContext::with_control_date(&ws.config, date(2024, 6, 30));

    let report = run_job(&RelationshipJob, &ctx).unwrap();
    assert_eq!(report.job, RelationshipJob.name());
    assert_eq!(report.rows("RLNSHIP.parquet"), Some(2));
    assert_eq!(report.rows("RLNSHIP.csv"), Some(2));
    // The later copy of 1 -> 2 differs only in its effective date
    assert_eq!(report.rows("RLNSHIP_DUPLICATES.parquet"), Some(1));

    let out = read_parquet("RLNSHIP", &ws.output("RLNSHIP.parquet"), None, 1024).unwrap();
    assert_eq!(
        column_values(&out, "CUSTNO1"),
        vec![Some("00000000001".into()), Some("00000000004".into())]
    );
    assert_eq!(column_values(&out, "DESC1"), vec![Some("FATHER".into()), Some("FATHER".into())]);
    assert_eq!(column_values(&out, "DESC2"), vec![Some("SON".into()), Some("SON".into())]);
    assert_eq!(column_values(&out, "CUSTNAME1"), vec![Some("ALI".into()), None]);
    assert_eq!(column_values(&out, "CUSTNAME2"), vec![Some("ABU".into()), None]);
    assert_eq!(column_values(&out, "ALIAS1"), vec![Some("ALI BIN ABU".into()), None]);
    assert_eq!(column_values(&out, "OLDIC1"), vec![Some("A1".into()), Some("A4".into())]);
    assert_eq!(column_values(&out, "OLDIC2"), vec![Some("A2".into()), None]);
    assert_eq!(column_values(&out, "EFFDATE"), vec![Some("20200101".into()), Some("20220101".into())]);
    assert_eq!(out.num_columns(), 18);
    assert!(!ws.has_temp_files());
}

#[test]
fn test_missing_input_fails_the_job() {
    let ws = Workspace::new();
    ws.add_input(
        RELATIONSHIPS,
        &table(RELATIONSHIPS, vec![("CUSTNO", texts(&["1"]))]),
    );
    let ctx = JobContext::with_control_date(&ws.config, date(2024, 6, 30));
    assert!(run_job(&RelationshipJob, &ctx).is_err());
    assert!(!ws.output("RLNSHIP.parquet").exists());
}

#[test]
fn test_second_customer_description_follows_its_own_code() {
    let ws = Workspace::new();
    add_fixtures(&ws);
    ws.add_input(
        RELATIONSHIPS,
        &table(
            RELATIONSHIPS,
            vec![
                ("CUSTNO", texts(&["1", "3"])),
                ("EFFDATE", texts(&["20200101", "20200101"])),
                ("CUSTNO2", texts(&["2", "2"])),
                ("CODE1", texts(&["10", "10"])),
                ("CODE2", texts(&["20", "30"])),
                ("EXPIRE_DATE", strings(&[None, None])),
            ],
        ),
    );
    ws.add_input(
        CODES,
        &table(
            CODES,
            vec![
                ("RLENTYPE", texts(&["CC", "CC", "CC"])),
                ("RLENCODE", texts(&["10", "20", "30"])),
                ("RLENDESC", texts(&["FATHER", "SON", "WIFE"])),
            ],
        ),
    );
    let ctx = JobContext::with_control_date(&ws.config, date(2024, 6, 30));

    let report = run_job(&RelationshipJob, &ctx).unwrap();
    assert_eq!(report.rows("RLNSHIP.parquet"), Some(2));
    assert_eq!(report.rows("RLNSHIP_DUPLICATES.parquet"), Some(0));

    let out = read_parquet("RLNSHIP", &ws.output("RLNSHIP.parquet"), None, 1024).unwrap();
    let pairs = column_values(&out, "CODE2")
        .into_iter()
        .zip(column_values(&out, "DESC2"))
        .collect::<Vec<_>>();
    assert_eq!(
        pairs,
        vec![(Some("20".into()), Some("SON".into())), (Some("30".into()), Some("WIFE".into()))]
    );
}
