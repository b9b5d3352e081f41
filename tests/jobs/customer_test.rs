use arrow::array::ArrayRef;
use cis_recon::jobs::{CustomerCombineJob, CustomerNameJob, CustomerReportJob, accounts, customer_combine, customer_name};
use cis_recon::jobs::customer_report::{self, REPORT_FILE, REPORT_TITLE};
use cis_recon::reader::read_parquet;
use cis_recon::{JobContext, run_job};

use crate::utils::{Workspace, column_values, date, ints, strings, table, texts};

const DERIVED: [&str; 12] = [
    "RUNTIMESTAMP", "CUSTNOX", "ADDREFX", "PRIPHONEX", "SECPHONEX", "MOBILEPHX", "FAXX", "OPENDT", "HRCALL", "RESDESC",
    "SALDESC", "CTZDESC",
];

/// Daily customer extract: customer 1 appears twice, customer 2 once
fn daily_customers() -> Vec<(String, ArrayRef)> {
    let mut columns = vec![
        ("CUSTNO".to_string(), texts(&["1", "1", "2"])),
        ("CUSTNAME".to_string(), texts(&["ALI", "ALI AGAIN", "ABU"])),
        ("PRIPHONE".to_string(), strings(&[Some("123456"), Some("999"), None])),
        ("SECPHONE".to_string(), texts(&["1", "1", "2"])),
        ("MOBILEPH".to_string(), texts(&["1", "1", "2"])),
        ("FAX".to_string(), texts(&["1", "1", "2"])),
        ("ADDREF".to_string(), texts(&["77", "77", "78"])),
        ("CUSTOPENDATE".to_string(), texts(&["03152020", "03152020", "00002000000"])),
        ("RESIDENCY".to_string(), texts(&["R1", "R1", "R9"])),
        ("CORPSTATUS".to_string(), texts(&["S1", "S1", ""])),
        ("CITIZENSHIP".to_string(), texts(&["MY", "MY", "SG"])),
        ("HRC01".to_string(), texts(&["1", "1", "7"])),
    ];
    for n in 2..=20 {
        columns.push((format!("HRC{n:02}"), strings(&[Some("0"), Some("0"), (n != 2).then_some("0")])));
    }
    for column in customer_combine::OUTPUT_COLUMNS {
        let supplied = columns.iter().any(|(name, _)| name == column);
        if !supplied && !DERIVED.contains(column) && !["EDUCATION", "INCOME"].contains(column) {
            let value = column.to_lowercase();
            columns.push(((*column).to_string(), texts(&[value.as_str(); 3])));
        }
    }
    columns
}

#[test]
fn test_customer_combine_end_to_end() {
    let ws = Workspace::new();
    let customers = cis_recon::Table::from_columns(customer_combine::CUSTOMERS, daily_customers()).unwrap();
    ws.add_input(customer_combine::CUSTOMERS, &customers);
    ws.add_input(
        customer_combine::INDIVIDUALS,
        &table(
            customer_combine::INDIVIDUALS,
            vec![
                ("CUSTNO", strings(&[Some("1"), Some("1"), None, Some("2")])),
                ("EDUCATION", texts(&["DEGREE", "MASTERS", "NOBODY", "DIPLOMA"])),
                ("INCOME", texts(&["1", "2", "3", "4"])),
            ],
        ),
    );
    ws.add_input(
        customer_combine::DEMOGRAPHICS,
        &table(
            customer_combine::DEMOGRAPHICS,
            vec![
                ("DEMOCATEGORY", texts(&["RESTR", "SALES", "CITZN", "SALES"])),
                ("DEMOCODE", texts(&["R1", "S1", "", "S1"])),
                ("DEMOCODX", texts(&["", "", "MY", ""])),
                ("CODEDESC", texts(&["RESIDENT", "SOLE PROPRIETOR", "MALAYSIAN", "DUPLICATE"])),
            ],
        ),
    );
    let ctx = JobContext::with_control_date(&ws.config, date(2024, 6, 30));

    let report = run_job(&CustomerCombineJob, &ctx).unwrap();
    assert_eq!(report.rows("COMBINECUSTALL.csv"), Some(2));

    let out = read_parquet("COMBINECUSTALL", &ws.output("COMBINECUSTALL.parquet"), None, 1024)
        .unwrap()
        .sort_asc(&["CUSTNOX"])
        .unwrap();
    assert_eq!(out.num_columns(), customer_combine::OUTPUT_COLUMNS.len());
    assert_eq!(
        column_values(&out, "CUSTNOX"),
        vec![Some("00000000001".into()), Some("00000000002".into())]
    );
    assert_eq!(column_values(&out, "CUSTNAME"), vec![Some("ALI".into()), Some("ABU".into())]);
    assert_eq!(column_values(&out, "PRIPHONEX"), vec![Some("00000123456".into()), None]);
    assert_eq!(column_values(&out, "ADDREFX")[1], Some("00000000078".into()));
    assert_eq!(column_values(&out, "OPENDT"), vec![Some("20200315".into()), Some("20000101".into())]);
    assert_eq!(column_values(&out, "HRCALL"), vec![Some(format!("001{}", "000".repeat(19))), None]);
    // The last individual record of a customer wins
    assert_eq!(column_values(&out, "EDUCATION"), vec![Some("MASTERS".into()), Some("DIPLOMA".into())]);
    assert_eq!(column_values(&out, "RESDESC"), vec![Some("RESIDENT".into()), None]);
    assert_eq!(column_values(&out, "SALDESC"), vec![Some("SOLE PROPRIETOR".into()), None]);
    assert_eq!(column_values(&out, "CTZDESC"), vec![Some("MALAYSIAN".into()), None]);

    let stamp = column_values(&out, "RUNTIMESTAMP")[0].clone().unwrap();
    assert_eq!(stamp.len(), 14);
    assert!(stamp.starts_with("20240630"));
}

#[test]
fn test_customer_name_end_to_end() {
    let ws = Workspace::new();
    ws.add_input(
        customer_name::NAMES,
        &table(
            customer_name::NAMES,
            vec![
                ("CUSTNO", ints(&[Some(2), Some(1), Some(1)])),
                ("CUSTNAME", texts(&["ABU", "ALI", "ALI AGAIN"])),
                ("ADREFNO", texts(&["8", "7", "7"])),
                ("PRIPHONE", texts(&["", "", ""])),
                ("SECPHONE", texts(&["", "", ""])),
                ("CUSTTYPE", texts(&["I", "I", "I"])),
                ("MOBILEPHONE", texts(&["012", "013", "013"])),
            ],
        ),
    );
    ws.add_input(
        customer_name::REMARKS,
        &table(
            customer_name::REMARKS,
            vec![
                ("BANKNO", texts(&["33"])),
                ("APPLCODE", texts(&["CUST"])),
                ("CUSTNO", texts(&["00000000001"])),
                ("EFFDATE", texts(&["20240101"])),
                ("RMKKEYWORD", texts(&["LONGNAME"])),
                ("LONGNAME", texts(&["ALI BIN ABU BAKAR"])),
                ("RMKOPERATOR", texts(&["OP1"])),
                ("EXPIREDATE", texts(&[""])),
                ("LASTMNTDATE", texts(&["20240102"])),
            ],
        ),
    );
    let ctx = JobContext::with_control_date(&ws.config, date(2024, 6, 30));

    let report = run_job(&CustomerNameJob, &ctx).unwrap();
    assert_eq!(report.rows(customer_name::OUTPUT_FILE), Some(2));

    let out = read_parquet("CISNAME_OUT", &ws.output(customer_name::OUTPUT_FILE), None, 1024).unwrap();
    assert_eq!(out.column_names(), customer_name::OUTPUT_COLUMNS.to_vec());
    assert_eq!(
        column_values(&out, "CUSTNO"),
        vec![Some("00000000001".into()), Some("00000000002".into())]
    );
    assert_eq!(column_values(&out, "CUSTNAME2"), vec![Some("ALI".into()), Some("ABU".into())]);
    assert_eq!(column_values(&out, "LONGNAME"), vec![Some("ALI BIN ABU BAKAR".into()), None]);
}

fn add_report_fixtures(ws: &Workspace) {
    let one = |v: &str| texts(&[v]);
    ws.add_input(
        customer_report::ALIASES,
        &table(
            customer_report::ALIASES,
            vec![("ALIASKEY", texts(&["IC", "IC"])), ("ALIAS", texts(&["800101015555", "900202026666"]))],
        ),
    );
    ws.add_input(
        customer_report::CUSTOMERS,
        &table(
            customer_report::CUSTOMERS,
            vec![
                ("ALIASKEY", texts(&["IC", "IC", "IC", "IC", "IC"])),
                (
                    "ALIAS",
                    texts(&["800101015555", "800101015555", "800101015555", "900202026666", "111"]),
                ),
                ("CUSTNO", texts(&["1", "1", "1", "2", "3"])),
                ("ACCTNOC", texts(&["4000000001", "2100000001", "9900000001", "5555", "4000000009"])),
                ("CUSTNAME", texts(&["ALI", "ALI", "ALI", "ABU", "NOBODY"])),
                ("OCCUP", texts(&["01", "01", "01", "02", "01"])),
                ("MASCO2008", texts(&["2411", "2411", "2411", "", ""])),
                ("MSICCODE", texts(&["", "", "", "", ""])),
                ("SICCODE", texts(&["", "", "", "S9", ""])),
            ],
        ),
    );
    ws.add_input(
        customer_report::OCCUPATIONS,
        &table(customer_report::OCCUPATIONS, vec![("DEMOCODE", one("01")), ("DEMODESC", one("CLERK"))]),
    );
    ws.add_input(
        customer_report::MASCO,
        &table(customer_report::MASCO, vec![("MASCO2008", one("2411")), ("MASCODESC", one("ACCOUNTANT"))]),
    );
    ws.add_input(
        customer_report::MSIC,
        &table(customer_report::MSIC, vec![("MSICCODE", one("01111")), ("MSICDESC", one("GROWING"))]),
    );
    ws.add_input(
        accounts::BALANCES,
        &table(
            accounts::BALANCES,
            vec![
                ("REPTNO", ints(&[Some(1001), Some(1001)])),
                ("FMTCODE", ints(&[Some(1), Some(1)])),
                ("ACCTNO", ints(&[Some(4_000_000_001), Some(4_000_000_009)])),
                ("ACCTBRCH1", ints(&[Some(5), Some(5)])),
                ("PRODTYPE", ints(&[Some(10), Some(10)])),
                ("COSTCTR", ints(&[Some(1200), Some(1200)])),
                ("LEDGERBAL1", ints(&[Some(5000), Some(1)])),
                ("ACCTNAME", texts(&["ALI", "NOBODY"])),
                ("PURPOSECD", texts(&["1", "1"])),
                ("OPENDATE", texts(&["20200101", "20200101"])),
                ("CLSEDATE", strings(&[None, None])),
                ("OPENIND", texts(&["", ""])),
                ("BALHOLD", texts(&["0", "0"])),
                ("CURBAL", texts(&["250.75", "1"])),
                ("ODLIMIT", texts(&["0", "0"])),
                ("CURRCODE", texts(&["MYR", "MYR"])),
                ("POSTIND", texts(&["", ""])),
            ],
        ),
    );
    ws.add_input(
        accounts::BRANCHES,
        &table(
            accounts::BRANCHES,
            vec![("ACCTBRCH", texts(&["5", "12"])), ("BRANCH_ABBR", texts(&["IPH", "KLC"]))],
        ),
    );
    ws.add_input(
        customer_report::CYCLES,
        &table(
            customer_report::CYCLES,
            vec![
                ("ACCTNO", ints(&[Some(4_000_000_001)])),
                ("ACCTNAME", one("ALI")),
                ("CURR_CYC_DR", ints(&[Some(2)])),
                ("CURR_AMT_DR", one("100.5")),
                ("CURR_CYC_CR", ints(&[Some(1)])),
                ("CURR_AMT_CR", one("-3")),
                ("PREV_CYC_DR", ints(&[Some(0)])),
                ("PREV_AMT_DR", one("0")),
                ("PREV_CYC_CR", ints(&[Some(0)])),
                ("PREV_AMT_CR", one("0")),
            ],
        ),
    );
    ws.add_input(
        customer_report::POSTINGS,
        &table(
            customer_report::POSTINGS,
            vec![
                ("ACCTNOC", one("04000000001")),
                ("ACCT_PST_IND", one("Y")),
                ("ACCT_PST_REASON", one("LEGAL")),
            ],
        ),
    );
    let mut holds = vec![("ACCTNO", ints(&[Some(4_000_000_001)])), ("TOT_HOLD", one("1"))];
    for (column, value) in [
        ("SEQID_1", "1"),
        ("SEQID_2", ""),
        ("SEQID_3", ""),
        ("AMT_1", "10"),
        ("AMT_2", ""),
        ("AMT_3", ""),
        ("DESC_1", "GARNISH"),
        ("DESC_2", ""),
        ("DESC_3", ""),
        ("SOURCE_1", "BR"),
        ("SOURCE_2", ""),
        ("SOURCE_3", ""),
    ] {
        holds.push((column, one(value)));
    }
    ws.add_input(customer_report::HOLDS, &table(customer_report::HOLDS, holds));
    ws.add_input(
        customer_report::LOANS,
        &table(
            customer_report::LOANS,
            vec![
                ("ACCTNO", ints(&[Some(2_100_000_001)])),
                ("NOTENO", ints(&[Some(1)])),
                ("ACCTNAME", one("ALI")),
                ("ORGTYPE", one("T1")),
                ("COSTCENTER", ints(&[Some(3005)])),
                ("ACCTOPENDATE", one("03152020000000")),
                ("LASTTRANDATE", one("06302024")),
                ("NOTECURBAL", ints(&[Some(150_000)])),
                ("NPLINDC", one("")),
                ("ARREARDAY", ints(&[Some(0)])),
                ("NOTEPAID", one("")),
            ],
        ),
    );
    ws.add_input(
        customer_report::SAFE_BOXES,
        &table(
            customer_report::SAFE_BOXES,
            vec![
                ("CUSTNO", one("1")),
                ("ACCTNAME40", one("ALI")),
                ("BRANCH_ABBR", one("KLC")),
                ("ACCTNOC", one("9900000001")),
                ("BANKINDC", one("C")),
                ("ACCTSTATUS", one("ACTIVE")),
            ],
        ),
    );
    let card = |name: &str, account: &str| {
        table(
            name,
            vec![
                ("BRANCH_ABBR", one("KLC")),
                ("ACCTNOC", one(account)),
                ("ACCTSTATUS", one("ACTIVE")),
                ("DATEOPEN", one("20230101")),
                ("DATECLSE", one("")),
            ],
        )
    };
    ws.add_input(customer_report::UNICARDS, &card(customer_report::UNICARDS, "5555"));
    ws.add_input(customer_report::COMCARDS, &card(customer_report::COMCARDS, "7777"));
}

#[test]
fn test_customer_report_end_to_end() {
    let ws = Workspace::new();
    add_report_fixtures(&ws);
    let ctx = JobContext::with_control_date(&ws.config, date(2024, 6, 30));

    let report = run_job(&CustomerReportJob, &ctx).unwrap();
    assert_eq!(report.rows(REPORT_FILE), Some(4));
    assert_eq!(report.rows("CUSTACCT.parquet"), Some(4));

    let text = ws.read_output(REPORT_FILE);
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some(REPORT_TITLE));
    let header = lines.next().unwrap().split(';').collect::<Vec<_>>();
    assert_eq!(header.len(), 40);
    let rows = lines.map(|l| l.split(';').collect::<Vec<_>>()).collect::<Vec<_>>();
    let field = |row: usize, label: &str| rows[row][header.iter().position(|h| *h == label).unwrap()];

    // Deposit, loan, safe deposit box and unicard, in that order
    assert_eq!(
        (0..4).map(|r| field(r, "ACCT NUMBER")).collect::<Vec<_>>(),
        vec!["04000000001", "02100000001", "09900000001", "00000005555"]
    );
    assert_eq!(field(0, "NO"), "1");
    assert_eq!(field(0, "ID TYPE"), "IC");
    assert_eq!(field(0, "CIS NUMBER"), "00000000001");
    assert_eq!(field(0, "OCCUPATION"), "CLERK");
    assert_eq!(field(0, "MASCO"), "ACCOUNTANT");
    assert_eq!(field(0, "SIC CODE"), "NIL");
    assert_eq!(field(0, "MSIC BIS TYPE"), "NIL");
    assert_eq!(field(0, "ACCT BRANCH"), "IPH");
    assert_eq!(field(0, "ACCT STATUS"), "ACTIVE");
    assert_eq!(field(0, "DATE ACCT OPEN"), "20200101");
    assert_eq!(field(0, "SDB(YES/NO)"), "NO");
    assert_eq!(field(0, "CURRENT BALANCE"), "250.75");
    assert_eq!(field(0, "CURR CYC DR"), "2");
    assert_eq!(field(0, "CURR AMT DR"), "100.50");
    assert_eq!(field(0, "CURR AMT CR"), "0.00");
    assert_eq!(field(0, "POST INDICATOR"), "Y");
    assert_eq!(field(0, "TOTAL OF HOLD"), "1");
    assert_eq!(field(0, "AMT OF HOLD(1)"), "10.00");
    assert_eq!(field(0, "DESCRIP OF HOLD(1)"), "GARNISH");

    assert_eq!(field(1, "ACCT BRANCH"), "IPH");
    assert_eq!(field(1, "DATE ACCT OPEN"), "20200315");
    assert_eq!(field(1, "CURRENT BALANCE"), "0.00");
    assert_eq!(field(1, "TOTAL OF HOLD"), "");

    assert_eq!(field(2, "SDB(YES/NO)"), "YES");
    assert_eq!(field(2, "BR SDB MAINTAN"), "KLC");

    assert_eq!(field(3, "CIS NUMBER"), "00000000002");
    assert_eq!(field(3, "SIC CODE"), "S9");
    assert_eq!(field(3, "OCCUPATION"), "NIL");
    assert_eq!(field(3, "NO"), "4");
}
