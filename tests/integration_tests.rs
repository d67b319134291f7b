use chrono::NaiveDate;
use delivery_change_rate::organization::{HEAD_OFFICE, OTHER, REGION_EAST, REGION_WEST};
use delivery_change_rate::responsibility::{CATEGORY_EXTERNAL, CATEGORY_INTERNAL};
use delivery_change_rate::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn change(
    person: &str,
    office: &str,
    before: NaiveDate,
    after: NaiveDate,
    application: Option<NaiveDate>,
) -> ChangeEvent {
    ChangeEvent {
        record_id: format!("{}:{}:{}", person, before, after),
        person_name: person.to_string(),
        departments: vec![office.to_string()],
        before_date: Some(before),
        after_date: Some(after),
        application_date: application,
        status: "承認済".to_string(),
        responsibility_raw: "施主都合".to_string(),
        change_reason_raw: String::new(),
    }
}

/// A 31-day slip applied for in December 2024.
fn december_change(person: &str, office: &str) -> ChangeEvent {
    change(person, office, date(2025, 1, 10), date(2025, 2, 10), Some(date(2024, 12, 20)))
}

fn backlog(month: &str, person: &str, count: u64) -> BacklogSnapshotEntry {
    BacklogSnapshotEntry {
        fiscal_year_month: month.to_string(),
        person_name: person.to_string(),
        open_order_count: count,
    }
}

fn detail<'a>(report: &'a Report, record_id: &str) -> &'a ClassifiedEvent {
    report
        .events
        .iter()
        .find(|e| e.event.record_id == record_id)
        .unwrap()
}

#[test]
fn test_materiality_boundaries_through_report() {
    let application = Some(date(2025, 1, 5));
    let before = date(2025, 2, 1);
    let events: Vec<ChangeEvent> = [7i64, -7, 8, -8]
        .iter()
        .map(|&shift| {
            let mut event = change(
                "佐藤 花子",
                "東京営業所",
                before,
                before + chrono::Duration::days(shift),
                application,
            );
            event.record_id = format!("shift{}", shift);
            event
        })
        .collect();

    let report = compute_report(52, &events, &[]).unwrap();

    assert!(!detail(&report, "shift7").is_counted);
    assert!(!detail(&report, "shift-7").is_counted);
    assert!(detail(&report, "shift8").is_counted);
    assert!(detail(&report, "shift-8").is_counted);
    assert_eq!(report.counted_event_count, 2);
    assert_eq!(report.series.months[5].change_count, 2);
}

#[test]
fn test_lead_time_boundaries() {
    let before = date(2025, 3, 31);
    let after = date(2025, 4, 30);
    let mut on_time = change("A", "東京営業所", before, after, Some(date(2025, 3, 1)));
    on_time.record_id = "lead30".to_string();
    let mut late = change("A", "東京営業所", before, after, Some(date(2025, 2, 28)));
    late.record_id = "lead31".to_string();

    let report = compute_report(52, &[on_time, late], &[]).unwrap();

    let lead30 = detail(&report, "lead30");
    assert_eq!(lead30.judgment1, Some(true));
    assert_eq!(lead30.judgment2, Some(true));

    let lead31 = detail(&report, "lead31");
    assert_eq!(lead31.judgment1, Some(false));
    assert_eq!(lead31.judgment2, Some(false));

    let external = report
        .judgment_tallies
        .iter()
        .find(|t| t.category == CATEGORY_EXTERNAL)
        .unwrap();
    assert_eq!(external.judgment1_yes, 1);
    assert_eq!(external.judgment1_no, 1);
    assert_eq!(external.judgment2_yes, 1);
    assert_eq!(external.judgment2_no, 1);
}

#[test]
fn test_judgment_flags_are_consistent() {
    let events = vec![
        change("A", "東京営業所", date(2025, 1, 10), date(2025, 1, 25), Some(date(2024, 12, 20))),
        change("A", "東京営業所", date(2025, 1, 10), date(2025, 3, 25), Some(date(2024, 10, 1))),
        change("B", "大阪営業所", date(2025, 1, 10), date(2025, 3, 25), None),
        change("B", "大阪営業所", date(2025, 1, 10), date(2025, 1, 12), Some(date(2025, 1, 1))),
    ];

    let report = compute_report(52, &events, &[]).unwrap();
    for event in &report.events {
        if event.judgment1 == Some(false) {
            assert_eq!(event.judgment2, Some(false));
        }
        if event.judgment1.is_none() {
            assert_eq!(event.judgment2, None);
        }
        assert_eq!(
            event.is_counted,
            event.days_diff.is_some_and(|d| d.abs() > 7)
        );
    }

    // Counted but without an application date: judgments absent, and no month to land in
    assert_eq!(report.unbucketed_event_count, 1);
    assert_eq!(report.counted_event_count, 3);
    assert_eq!(report.series.total_change_count, 2);
}

#[test]
fn test_documented_scenarios() {
    let application = Some(date(2024, 12, 20));
    let mut counted = change(
        "佐藤 花子",
        "東京営業所",
        date(2025, 1, 10),
        date(2025, 1, 25),
        application,
    );
    counted.record_id = "counted".to_string();
    let mut minor = change(
        "佐藤 花子",
        "東京営業所",
        date(2025, 1, 10),
        date(2025, 1, 14),
        application,
    );
    minor.record_id = "minor".to_string();

    let snapshots = vec![backlog("202412", "佐藤 花子", 5)];
    let report = compute_report(52, &[counted, minor], &snapshots).unwrap();

    let counted = detail(&report, "counted");
    assert_eq!(counted.days_diff, Some(15));
    assert!(counted.is_counted);
    assert_eq!(counted.judgment1, Some(true));
    assert_eq!(counted.judgment2, Some(true));

    let minor = detail(&report, "minor");
    assert_eq!(minor.days_diff, Some(4));
    assert!(!minor.is_counted);

    assert_eq!(report.series.total_change_count, 1);
    assert_eq!(report.series.months[4].change_count, 1);
    assert!((report.series.months[4].change_rate - 0.2).abs() < 1e-12);

    let external_rows: u64 = report
        .responsibility_items
        .iter()
        .filter(|i| i.category == CATEGORY_EXTERNAL)
        .map(|i| i.total)
        .sum();
    assert_eq!(external_rows, 1);
}

#[test]
fn test_missing_snapshots_yield_zero_rates() {
    let events = vec![
        december_change("佐藤 花子", "東京営業所"),
        change(
            "中村 三郎",
            "福岡営業所",
            date(2025, 5, 10),
            date(2025, 6, 10),
            Some(date(2025, 4, 1)),
        ),
    ];

    let report = compute_report(52, &events, &[]).unwrap();

    assert_eq!(report.series.total_change_count, 2);
    assert_eq!(report.series.total_backlog_count, 0);
    assert_eq!(report.series.change_rate, 0.0);
    for region in &report.regions {
        assert_eq!(region.series.change_rate, 0.0);
        for office in &region.offices {
            for person in &office.persons {
                assert!(person.series.months.iter().all(|m| m.change_rate == 0.0));
                assert!(person.series.change_rate.is_finite());
            }
        }
    }
    assert_eq!(report.office("福岡営業所").unwrap().series.months[8].change_count, 1);
}

#[test]
fn test_head_office_override() {
    let config = EngineConfig {
        head_office_person: "山本 健一".to_string(),
        ..Default::default()
    };
    let engine = ReportEngine::new(config).unwrap();
    let events = vec![change(
        "山本 健一",
        "大阪営業所",
        date(2025, 1, 10),
        date(2025, 2, 10),
        Some(date(2024, 12, 20)),
    )];

    let report = engine.compute(52, &events, &[]).unwrap();
    assert_eq!(report.events[0].office, HEAD_OFFICE);
    assert_eq!(report.events[0].region, HEAD_OFFICE);

    let head_office = report.region(HEAD_OFFICE).unwrap();
    assert_eq!(head_office.series.total_change_count, 1);
    assert_eq!(report.region(REGION_WEST).unwrap().series.total_change_count, 0);
}

#[test]
fn test_taxonomy_rows_always_present_once() {
    let taxonomy = ResponsibilityTaxonomy::default();
    let events = vec![{
        let mut e = december_change("A", "東京営業所");
        e.responsibility_raw = CATEGORY_INTERNAL.to_string();
        e.change_reason_raw = "積算ミス".to_string();
        e
    }];

    let report = compute_report(52, &events, &[]).unwrap();

    for entry in taxonomy.entries() {
        let matches = report
            .responsibility_items
            .iter()
            .filter(|i| i.category == entry.category && i.reason == entry.reason)
            .count();
        assert_eq!(matches, 1, "{} / {}", entry.category, entry.reason);
    }
    for item in &report.responsibility_items {
        assert_eq!(item.monthly_counts.len(), 12);
    }

    let row = report
        .responsibility_items
        .iter()
        .find(|i| i.reason == "積算ミス")
        .unwrap();
    assert_eq!(row.total, 1);
    assert_eq!(row.monthly_counts["202412"], 1);
}

#[test]
fn test_rollups_are_exact() {
    let events = vec![
        december_change("佐藤 花子", "東京営業所"),
        change("田中 次郎", "東京", date(2025, 1, 10), date(2025, 2, 10), Some(date(2025, 1, 2))),
        change(
            "鈴木 一郎",
            "札幌営業所",
            date(2025, 3, 10),
            date(2025, 2, 10),
            Some(date(2025, 2, 2)),
        ),
        change(
            "中村 三郎",
            "広島営業所",
            date(2025, 3, 10),
            date(2025, 4, 10),
            Some(date(2024, 8, 2)),
        ),
        change("", "", date(2025, 3, 10), date(2025, 4, 10), Some(date(2024, 9, 2))),
    ];
    let snapshots = vec![
        backlog("202412", "佐藤 花子", 12),
        backlog("202412", "佐藤 花子", 3),
        backlog("202501", "田中 次郎", 9),
        backlog("202502", "鈴木 一郎", 4),
        backlog("202408", "中村 三郎", 6),
        backlog("202408", "小林 四郎", 2),
    ];

    let report = compute_report(52, &events, &snapshots).unwrap();
    verify_rollups(&report).unwrap();

    for region in &report.regions {
        let office_sum: u64 = region.offices.iter().map(|o| o.series.total_change_count).sum();
        assert_eq!(office_sum, region.series.total_change_count);
        for office in &region.offices {
            let person_sum: u64 = office.persons.iter().map(|p| p.series.total_change_count).sum();
            assert_eq!(person_sum, office.series.total_change_count);
            let backlog_sum: u64 = office
                .persons
                .iter()
                .map(|p| p.series.total_backlog_count)
                .sum();
            assert_eq!(backlog_sum, office.series.total_backlog_count);
        }
    }

    assert_eq!(report.series.total_change_count, 5);
    assert_eq!(report.series.total_backlog_count, 36);
    assert_eq!(report.region(REGION_EAST).unwrap().series.total_change_count, 3);
    assert_eq!(report.office("東京営業所").unwrap().series.months[4].backlog_count, 15);

    // Unassigned person and backlog-only person both land in the other region
    let other = report.region(OTHER).unwrap();
    assert_eq!(other.series.total_change_count, 1);
    assert_eq!(other.series.total_backlog_count, 2);
}

#[test]
fn test_report_ordering() {
    let events = vec![
        december_change("渡辺 五郎", "福岡営業所"),
        december_change("佐藤 花子", "東京営業所"),
        december_change("伊藤 六郎", "東京営業所"),
        december_change("安藤 美咲", "東京営業所"),
        december_change("Baker", "東京営業所"),
        december_change("Adams", "東京営業所"),
        december_change("X", "海外事業部"),
    ];

    let report = compute_report(52, &events, &[]).unwrap();

    let regions: Vec<&str> = report.regions.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(regions, vec![REGION_EAST, REGION_WEST, HEAD_OFFICE, OTHER]);

    let east: Vec<&str> = report.regions[0].offices.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(east, vec!["札幌営業所", "仙台営業所", "東京営業所", "横浜営業所"]);

    let tokyo = report.office("東京営業所").unwrap();
    let persons: Vec<&str> = tokyo.persons.iter().map(|p| p.name.as_str()).collect();
    // Japanese collation: Latin first, then kanji by reading (あんどう, いとう, さとう)
    assert_eq!(
        persons,
        vec!["Adams", "Baker", "安藤 美咲", "伊藤 六郎", "佐藤 花子"]
    );

    let other = report.region(OTHER).unwrap();
    assert_eq!(other.offices.len(), 1);
    assert_eq!(other.offices[0].name, "海外事業部");
}

#[test]
fn test_uncounted_person_backlog_stays_in_office() {
    let events = vec![
        change("A", "東京営業所", date(2025, 1, 10), date(2025, 1, 25), Some(date(2024, 12, 20))),
        change("B", "東京営業所", date(2025, 1, 10), date(2025, 1, 13), Some(date(2024, 12, 20))),
    ];
    let snapshots = vec![backlog("202412", "A", 10), backlog("202412", "B", 10)];

    let report = process_with_verification(&ReportRequest {
        fiscal_period: 52,
        events,
        snapshots,
    })
    .unwrap();

    let tokyo = report.office("東京営業所").unwrap();
    assert_eq!(tokyo.series.total_backlog_count, 20);
    assert!((tokyo.series.change_rate - 0.05).abs() < 1e-12);
    assert!((report.region(REGION_EAST).unwrap().series.change_rate - 0.05).abs() < 1e-12);
    assert!(report.region(OTHER).is_none());
}

#[test]
fn test_roster_from_config_places_backlog_only_person() -> anyhow::Result<()> {
    let config = EngineConfig::from_json_str(
        r#"{"directory": {"roster": {"鈴木 一郎": ["仙台営業所"]}}}"#,
    )?;
    let request = ReportRequest {
        fiscal_period: 52,
        events: vec![],
        snapshots: vec![backlog("202501", "鈴木 一郎", 7)],
    };

    let report = ChangeRateProcessor::process_with_verification(&config, &request)?;
    let sendai = report.office("仙台営業所").unwrap();
    assert_eq!(sendai.series.total_backlog_count, 7);
    assert_eq!(sendai.persons[0].name, "鈴木 一郎");
    Ok(())
}

#[test]
fn test_other_region_omitted_when_empty() {
    let report = compute_report(52, &[], &[]).unwrap();
    let regions: Vec<&str> = report.regions.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(regions, vec![REGION_EAST, REGION_WEST, HEAD_OFFICE]);
}

#[test]
fn test_ingested_records_end_to_end() -> anyhow::Result<()> {
    let records: Vec<RawChangeRecord> = serde_json::from_str(
        r#"[
            {
                "recordId": "9001",
                "personName": "佐藤 花子",
                "departments": ["東京営業所"],
                "beforeDate": "2025/01/10",
                "afterDate": "2025-01-25",
                "applicationDate": 1734620400000,
                "status": "承認済",
                "responsibility": "社内責任",
                "changeReason": "設計変更遅延"
            },
            {
                "recordId": "9002",
                "personName": "佐藤 花子",
                "beforeDate": "　",
                "afterDate": 45682,
                "responsibility": "天候不良"
            }
        ]"#,
    )?;
    let snapshots: Vec<RawSnapshotRecord> = serde_json::from_str(
        r#"[{ "fiscalYearMonth": "202412", "personName": "佐藤 花子", "openOrderCount": "8" }]"#,
    )?;

    let request = ReportRequest {
        fiscal_period: 52,
        events: convert_change_records(records),
        snapshots: convert_snapshot_records(snapshots),
    };
    let report = process_with_verification(&request)?;

    let first = detail(&report, "9001");
    assert_eq!(first.application_fiscal_month.as_deref(), Some("202412"));
    assert_eq!(first.responsibility_category, CATEGORY_INTERNAL);
    assert_eq!(first.change_reason, "設計変更遅延");

    let second = detail(&report, "9002");
    assert_eq!(second.days_diff, None);
    assert!(!second.is_counted);
    assert_eq!(second.responsibility_category, CATEGORY_EXTERNAL);
    assert_eq!(second.change_reason, "天候不良");

    assert!((report.series.months[4].change_rate - 0.125).abs() < 1e-12);
    Ok(())
}

#[test]
fn test_report_json_shape() {
    let events = vec![change(
        "佐藤 花子",
        "東京営業所",
        date(2025, 1, 10),
        date(2025, 1, 25),
        Some(date(2024, 12, 20)),
    )];
    let report = compute_report(52, &events, &[]).unwrap();
    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

    assert_eq!(json["fiscalPeriod"], 52);
    assert_eq!(json["yearMonths"][0], "202408");
    assert_eq!(json["totalChangeCount"], 1);
    assert_eq!(json["events"][0]["isCounted"], true);
    assert_eq!(json["events"][0]["personName"], "佐藤 花子");
    assert_eq!(json["events"][0]["applicationFiscalMonth"], "202412");
    assert!(json["events"][0].get("periodSlot").is_none());
    assert_eq!(json["regions"][0]["offices"][2]["persons"][0]["name"], "佐藤 花子");
}

#[test]
fn test_drill_down_list_is_capped() {
    let config = EngineConfig {
        max_detail_events: 3,
        ..Default::default()
    };
    let engine = ReportEngine::new(config).unwrap();
    let events: Vec<ChangeEvent> = (0..10)
        .map(|i| {
            change(
                "A",
                "東京営業所",
                date(2025, 1, 10),
                date(2025, 1, 11 + i),
                Some(date(2024, 12, 20)),
            )
        })
        .collect();

    let report = engine.compute(52, &events, &[]).unwrap();
    assert_eq!(report.events.len(), 3);
    assert!(report.events_truncated);
    assert_eq!(report.total_event_count, 10);
    assert_eq!(report.counted_event_count, 3);
}

#[tokio::test]
async fn test_fetch_and_compute_with_static_sources() {
    let engine = ReportEngine::new(EngineConfig::default()).unwrap();
    let source = StaticSource {
        events: vec![change(
            "佐藤 花子",
            "東京営業所",
            date(2025, 1, 10),
            date(2025, 1, 25),
            Some(date(2024, 12, 20)),
        )],
        snapshots: vec![backlog("202412", "佐藤 花子", 4)],
    };

    let report = fetch_and_compute(&engine, 52, &source, None).await.unwrap();
    assert_eq!(report.series.total_backlog_count, 0);
    assert_eq!(report.series.total_change_count, 1);

    let snapshots: &dyn SnapshotSource = &source;
    let report = fetch_and_compute(&engine, 52, &source, Some(snapshots)).await.unwrap();
    assert_eq!(report.series.total_backlog_count, 4);
    assert!((report.series.change_rate - 0.25).abs() < 1e-12);
}
