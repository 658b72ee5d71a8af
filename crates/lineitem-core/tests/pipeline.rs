use std::collections::HashSet;

use lineitem_core::{
    build_report, dedupe_transactions, transactions_from_table, CellValue, LookupTable, MatchStatus, RawTable,
    ReportError, TableKind, DEFAULT_LINE_ITEM_FIELD,
};

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn transaction_table(rows: &[(&str, f64, &str)], source: &str) -> RawTable {
    let rows = rows
        .iter()
        .map(|(id, total, impressions)| {
            vec![
                CellValue::from(*id),
                CellValue::Float(*total),
                CellValue::from(*impressions),
            ]
        })
        .collect();
    RawTable::new(headers(&["Transaction ID", "Transaction Total", "Impressions"]), rows)
        .with_constant_column("Source File Name", CellValue::from(source))
}

fn lookup_table() -> RawTable {
    RawTable::new(
        headers(&[
            "advertiser_name",
            "insertion_order_name",
            "line_item_id",
            "line_item_name",
            "impressions",
            "advertiser_invoice",
        ]),
        vec![
            vec![
                "Acme".into(),
                "Spring".into(),
                CellValue::Int(200),
                "Display".into(),
                CellValue::Int(1000),
                CellValue::Float(30.0),
            ],
            vec![
                "Acme".into(),
                "Spring".into(),
                CellValue::Float(200.0),
                "".into(),
                CellValue::Int(500),
                CellValue::Float(20.0),
            ],
            vec![
                "Acme".into(),
                "Summer".into(),
                CellValue::Int(300),
                "Video".into(),
                CellValue::Int(10),
                CellValue::Float(0.0),
            ],
            vec![
                "Beta".into(),
                "Fall".into(),
                CellValue::Float(123456789012345.0),
                "Audio".into(),
                CellValue::Int(5),
                CellValue::Float(8.0),
            ],
            vec![
                "Beta".into(),
                "Fall".into(),
                CellValue::Int(999),
                "Unused".into(),
                CellValue::Int(1),
                CellValue::Float(12.0),
            ],
        ],
    )
}

fn sample_transactions() -> Vec<lineitem_core::Transaction> {
    let first = transaction_table(
        &[
            (
                "T1",
                100.0,
                r#"[{"LINEITEMID":200},{"LINEITEMID":"300"},{"LINEITEMID":"200"}]"#,
            ),
            ("T2", 50.0, r#"[{"LINEITEMID":"200"}]"#),
            ("T3", 25.0, r#"[{"LINEITEMID":"777"}]"#),
        ],
        "first.csv",
    );
    let second = transaction_table(
        &[
            ("T2", 5000.0, r#"[{"LINEITEMID":"300"}]"#),
            ("T4", 10.0, r#"[{"LINEITEMID":123456789012345}]"#),
            ("T5", 40.0, "not json"),
        ],
        "second.csv",
    );

    dedupe_transactions([
        transactions_from_table(&first).unwrap(),
        transactions_from_table(&second).unwrap(),
    ])
}

#[test]
fn test_report_is_idempotent() {
    let transactions = sample_transactions();
    let lookup = LookupTable::from_table(&lookup_table()).unwrap();

    let a = build_report(&transactions, &lookup, DEFAULT_LINE_ITEM_FIELD).unwrap();
    let b = build_report(&transactions, &lookup, DEFAULT_LINE_ITEM_FIELD).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_duplicate_transactions_keep_first_occurrence() {
    let transactions = sample_transactions();
    let ids: Vec<&str> = transactions.iter().map(|t| t.transaction_id.as_str()).collect();
    assert_eq!(ids, vec!["T1", "T2", "T3", "T4", "T5"]);

    let t2 = &transactions[1];
    assert_eq!(t2.transaction_total, Some(50.0));
    assert_eq!(t2.source_file_name.as_deref(), Some("first.csv"));
}

#[test]
fn test_revenue_is_conserved_per_attribution() {
    let transactions = sample_transactions();
    let lookup = LookupTable::from_table(&lookup_table()).unwrap();
    let report = build_report(&transactions, &lookup, DEFAULT_LINE_ITEM_FIELD).unwrap();

    // T1 -> {200, 300}, T2 -> {200}, T3 -> {777}, T4 -> {big}, T5 -> {}
    let expected = 100.0 * 2.0 + 50.0 + 25.0 + 10.0;
    assert_eq!(report.summary.total_revenue, expected);
    assert_eq!(report.summary.total_transactions, 5);
}

#[test]
fn test_join_is_complete_and_disjoint() {
    let transactions = sample_transactions();
    let lookup = LookupTable::from_table(&lookup_table()).unwrap();
    let report = build_report(&transactions, &lookup, DEFAULT_LINE_ITEM_FIELD).unwrap();

    let performance: HashSet<&str> = report.performance.iter().map(|r| r.line_item_id.as_str()).collect();
    let unmatched: HashSet<&str> = report
        .unmatched_lookup
        .iter()
        .map(|e| e.line_item_id.as_str())
        .collect();

    assert_eq!(performance.len(), report.performance.len());
    assert!(performance.is_disjoint(&unmatched));
    assert_eq!(
        performance,
        HashSet::from(["123456789012345", "200", "300", "777"])
    );
    assert_eq!(unmatched, HashSet::from(["999"]));
    assert_eq!(report.unmatched_lookup_spend(), 12.0);

    let row_777 = report
        .performance
        .iter()
        .find(|r| r.line_item_id == "777")
        .unwrap();
    assert_eq!(row_777.match_status, MatchStatus::NoMatchFound);
    assert_eq!(row_777.lookup.line_item_name, None);
}

#[test]
fn test_ratio_rule() {
    let transactions = sample_transactions();
    let lookup = LookupTable::from_table(&lookup_table()).unwrap();
    let report = build_report(&transactions, &lookup, DEFAULT_LINE_ITEM_FIELD).unwrap();

    for row in &report.performance {
        match row.lookup.spend {
            Some(spend) if spend > 0.0 => {
                assert_eq!(row.influenced_roas, Some(row.total_transaction_amount / spend));
            }
            _ => assert_eq!(row.influenced_roas, None),
        }
    }

    let row_200 = report
        .performance
        .iter()
        .find(|r| r.line_item_id == "200")
        .unwrap();
    assert_eq!(row_200.unique_transaction_count, 2);
    assert_eq!(row_200.transaction_ids, "T1, T2");
    assert_eq!(row_200.lookup.spend, Some(50.0));
    assert_eq!(row_200.lookup.impressions, Some(1500.0));
    assert_eq!(row_200.influenced_roas, Some(3.0));

    let row_300 = report
        .performance
        .iter()
        .find(|r| r.line_item_id == "300")
        .unwrap();
    assert_eq!(row_300.match_status, MatchStatus::Matched);
    assert_eq!(row_300.influenced_roas, None);
}

#[test]
fn test_spend_breakdown_adds_up_to_lookup_total() {
    let transactions = sample_transactions();
    let table = RawTable::new(
        headers(&["line_item_id", "line_item_name", "impressions", "advertiser_invoice"]),
        vec![
            vec![CellValue::Int(200), "Display".into(), CellValue::Int(1000), CellValue::Float(30.0)],
            vec![CellValue::Int(777), "".into(), CellValue::Int(40), CellValue::Float(20.0)],
            vec![CellValue::Int(999), "Unused".into(), CellValue::Int(1), CellValue::Float(12.0)],
        ],
    );
    let lookup = LookupTable::from_table(&table).unwrap();
    let report = build_report(&transactions, &lookup, DEFAULT_LINE_ITEM_FIELD).unwrap();

    assert_eq!(report.summary.total_spend, 30.0);
    assert_eq!(report.unnamed_lookup_spend(), 20.0);
    assert_eq!(report.unmatched_lookup_spend(), 12.0);
    assert_eq!(
        report.summary.total_spend + report.unnamed_lookup_spend() + report.unmatched_lookup_spend(),
        report.summary.total_lookup_spend
    );
}

#[test]
fn test_large_identifier_matches_lookup() {
    let transactions = sample_transactions();
    let lookup = LookupTable::from_table(&lookup_table()).unwrap();
    let report = build_report(&transactions, &lookup, DEFAULT_LINE_ITEM_FIELD).unwrap();

    let big = report
        .performance
        .iter()
        .find(|r| r.line_item_id == "123456789012345")
        .unwrap();
    assert_eq!(big.match_status, MatchStatus::Matched);
    assert_eq!(big.lookup.line_item_name.as_deref(), Some("Audio"));
    assert_eq!(big.influenced_roas, Some(1.25));
}

#[test]
fn test_lookup_without_spend_column_is_rejected() {
    let table = RawTable::new(
        headers(&["line_item_id", "line_item_name", "impressions"]),
        vec![vec![CellValue::Int(1), "One".into(), CellValue::Int(1)]],
    );

    let err = LookupTable::from_table(&table).unwrap_err();
    let ReportError::MissingColumns { table: kind, missing, .. } = &err;
    assert_eq!(*kind, TableKind::Lookup);
    assert_eq!(missing, &vec!["advertiser_invoice".to_string()]);
    assert!(err.to_string().contains("advertiser_invoice"));
}

#[test]
fn test_transactions_without_line_items_produce_no_report() {
    let table = transaction_table(&[("T1", 10.0, "[]"), ("T2", 5.0, "")], "empty.csv");
    let transactions = transactions_from_table(&table).unwrap();
    let lookup = LookupTable::from_table(&lookup_table()).unwrap();

    assert!(build_report(&transactions, &lookup, DEFAULT_LINE_ITEM_FIELD).is_none());
}
