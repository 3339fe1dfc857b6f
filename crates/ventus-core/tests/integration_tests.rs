//! Integration tests for ventus-core
//!
//! These tests exercise the full import → enrich → correct → report → deals
//! workflow, with the enrichment functions served by the mock server.

use std::time::Duration;

use chrono::NaiveDate;
use ventus_core::{
    ai::{AIBackend, AIClient, HttpBackend},
    deals::{personalize_deals, select_deals},
    enrich::{apply_corrections, merge},
    filter::{apply_filters, SelectionFilter, TransactionFilter},
    import::{normalize_text, ImportOutcome, NormalizeOptions, NormalizedBatch},
    models::{CardProduct, DisplayMode, OpportunityLevel, Pillar, Region},
    profile::derive_profile,
    reports::{
        cross_sell_matrix, merchant_report, pillar_report, revenue_opportunities,
        DEFAULT_PERCENT_DECIMALS,
    },
    sample,
    store::SessionStore,
    test_utils::MockEnrichmentServer,
    Error,
};

/// Statement with one travel purchase, a big gym bill and one unreadable row
fn statement() -> &'static str {
    r#"Date,Description,Amount,Zip
06/01/2024,STARBUCKS #1234,6.50,94110
06/02/2024,DELTA AIR LINES - Denver,450.00,94110
06/03/2024,EQUINOX MEMBERSHIP,1500.00,94110
06/04/2024,NETFLIX.COM,15.49,
not a date,MYSTERY,3.00,94110
06/05/2024,MYSTERY SHOP,20.00,94110"#
}

fn import_statement() -> NormalizedBatch {
    let options = NormalizeOptions {
        anchor_zip: Some("94103".to_string()),
        derive_merchants: true,
        ..Default::default()
    };
    match normalize_text(statement(), &options).expect("statement should parse") {
        ImportOutcome::Ready(batch) => batch,
        other => panic!("expected a ready batch, got {:?}", other),
    }
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

// =============================================================================
// Pipeline
// =============================================================================

#[tokio::test]
async fn test_full_pipeline_against_mock_service() {
    let server = MockEnrichmentServer::start().await;
    let client = AIClient::Http(HttpBackend::new(&server.url()).with_batch_size(2));

    let batch = import_statement();
    assert_eq!(batch.transactions.len(), 5);
    assert_eq!(batch.skipped.len(), 1);
    assert_eq!(batch.skipped[0].line, 6);
    // Row without a ZIP takes the anchor
    assert_eq!(batch.transactions[3].zip_code.as_deref(), Some("94103"));

    let results = client
        .enrich_transactions(&batch.transactions)
        .await
        .expect("enrichment should succeed");
    assert_eq!(server.enrich_calls(), 3);

    let enriched = merge(&batch.transactions, &results);
    assert!(enriched.iter().all(|t| t.enrichment.classification().is_some()));

    let report = pillar_report(&enriched, DEFAULT_PERCENT_DECIMALS);
    let keys: Vec<&str> = report.rows().map(|g| g.key.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "Sports & Active Living",
            "Travel & Exploration",
            "Other",
            "Entertainment & Culture",
            "Food & Dining",
        ]
    );
    assert!(approx(report.total, 1991.99));
    let pct: f64 = report.rows().map(|g| g.percentage).sum();
    assert!(approx(pct, 100.0));

    let profile = derive_profile(&enriched);
    assert!(profile
        .lifestyle_signals
        .contains(&"fitness enthusiast".to_string()));
    assert_eq!(profile.location_context.home_zip.as_deref(), Some("94110"));
    assert_eq!(
        profile.location_context.travel_destinations,
        vec!["Denver".to_string()]
    );

    let deals = select_deals(&profile, 4);
    assert_eq!(deals[0].pillar, Pillar::SportsActiveLiving);

    let outcome = personalize_deals(Some(&client), &deals, &profile).await;
    assert!(outcome.notice.is_none());
    assert!(outcome.deals.iter().all(|d| d.personalized));
    assert!(outcome.deals[0].message.contains("fitness enthusiast"));
}

#[tokio::test]
async fn test_service_failure_keeps_session_untouched() {
    let server = MockEnrichmentServer::start_failing().await;
    let client = AIClient::http(&server.url());

    let dir = tempfile::tempdir().unwrap();
    let mut store = SessionStore::open(dir.path().join("session.json"));
    store.load_batch(import_statement()).unwrap();
    let before = store.base().to_vec();

    let err = client
        .enrich_transactions(&store.transactions())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Service(_)));
    assert_eq!(store.base(), before.as_slice());

    // Deals still render with catalog copy and a notice
    let profile = derive_profile(&store.corrected());
    let deals = select_deals(&profile, 2);
    let outcome = personalize_deals(Some(&client), &deals, &profile).await;
    assert!(outcome.notice.is_some());
    assert_eq!(outcome.deals.len(), deals.len());
    assert!(outcome.deals.iter().all(|d| !d.personalized));
}

#[tokio::test]
async fn test_slow_service_times_out() {
    let server = MockEnrichmentServer::start_slow(Duration::from_millis(400)).await;
    let backend = HttpBackend::new(&server.url()).with_timeout(Duration::from_millis(50));

    let batch = import_statement();
    let err = backend
        .enrich_transactions(&batch.transactions)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Http(_)));
}

#[tokio::test]
async fn test_session_corrections_flow_into_reports() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let client = AIClient::mock();

    let mut store = SessionStore::open(&path);
    store.load_batch(import_statement()).unwrap();
    let results = client
        .enrich_transactions(&store.transactions())
        .await
        .unwrap();
    store
        .set_enriched(merge(&store.transactions(), &results))
        .unwrap();

    let mystery = store
        .base()
        .iter()
        .find(|t| t.transaction.description == "MYSTERY SHOP")
        .map(|t| t.id().to_string())
        .unwrap();
    store
        .correct(&mystery, Pillar::ShoppingRetail, "Boutiques", None)
        .unwrap();

    // Reopen from disk: the correction survives and shows up in reports
    let store = SessionStore::open(&path);
    let corrected = store.view(&TransactionFilter::new());
    let report = pillar_report(&corrected, DEFAULT_PERCENT_DECIMALS);
    assert!(report.rows().any(|g| g.key == "Shopping & Retail"));
    assert!(!report.rows().any(|g| g.key == "Other"));

    let raw = store.view(&TransactionFilter::new().display_mode(DisplayMode::Raw));
    let raw_report = pillar_report(&raw, DEFAULT_PERCENT_DECIMALS);
    assert!(raw_report.rows().any(|g| g.key == "Other"));

    // The corrected transaction keeps its low engine confidence
    let confident = store.view(&TransactionFilter::new().confidence_threshold(50.0));
    assert!(confident.iter().all(|t| t.id() != mystery));

    // Excluding misc drops nothing once Other is corrected away
    let no_misc = store.view(&TransactionFilter::new().include_misc(false));
    assert_eq!(no_misc.len(), corrected.len());
}

// =============================================================================
// Testable properties
// =============================================================================

#[tokio::test]
async fn test_filters_and_corrections_compose() {
    let batch = import_statement();
    let results = AIClient::mock()
        .enrich_transactions(&batch.transactions)
        .await
        .unwrap();
    let enriched = merge(&batch.transactions, &results);

    let identity = apply_filters(&enriched, &TransactionFilter::new());
    assert_eq!(identity, enriched);

    let june_early = TransactionFilter::new().date_range(Some((
        NaiveDate::from_ymd_opt(2024, 6, 2).unwrap(),
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
    )));
    let subset = apply_filters(&enriched, &june_early);
    assert_eq!(subset.len(), 2);
    assert_eq!(subset[0].id(), enriched[1].id());
    assert_eq!(subset[1].id(), enriched[2].id());

    let mut corrections = ventus_core::CorrectionSet::new();
    corrections
        .record(
            ventus_core::Correction::new(&enriched[0], Pillar::TravelExploration, "Airfare", None),
            &enriched,
        )
        .unwrap();
    let once = apply_corrections(&enriched, &corrections);
    let twice = apply_corrections(&once, &corrections);
    assert_eq!(once, twice);
    assert_eq!(once[0].enrichment.subcategory(), Some("Airfare"));
}

#[test]
fn test_empty_statement_is_rejected() {
    for raw in ["", "   \n\t  "] {
        let err = normalize_text(raw, &NormalizeOptions::default()).unwrap_err();
        assert!(matches!(err, Error::NoData));
    }
}

#[test]
fn test_unrecognized_headers_need_mapping() {
    let raw = "When,What,How Much\n06/01/2024,COFFEE,4.00";
    match normalize_text(raw, &NormalizeOptions::default()).unwrap() {
        ImportOutcome::NeedsMapping { headers, suggestion } => {
            assert_eq!(headers, vec!["When", "What", "How Much"]);
            assert!(!suggestion.is_complete());
        }
        other => panic!("expected NeedsMapping, got {:?}", other),
    }
}

#[tokio::test]
async fn test_merchant_report_is_stable() {
    let batch = import_statement();
    let results = AIClient::mock()
        .enrich_transactions(&batch.transactions)
        .await
        .unwrap();
    let enriched = merge(&batch.transactions, &results);

    let first = merchant_report(&enriched, 3, DEFAULT_PERCENT_DECIMALS);
    let second = merchant_report(&enriched, 3, DEFAULT_PERCENT_DECIMALS);
    assert_eq!(first, second);
    assert_eq!(first.groups.len(), 3);

    let remainder = first.remainder.as_ref().expect("two merchants folded");
    assert_eq!(remainder.transaction_count, 2);
    let sum: f64 = first.rows().map(|g| g.amount).sum();
    assert!(approx(sum, first.total));
}

// =============================================================================
// Sample analytics
// =============================================================================

#[test]
fn test_cross_sell_over_selection() {
    let all = sample::records(&SelectionFilter::new());
    let matrix = cross_sell_matrix(&all);
    let cell = matrix
        .cell(CardProduct::CashBack, CardProduct::TravelRewards)
        .unwrap();
    assert_eq!(cell.level, OpportunityLevel::High);

    let diagonal = matrix
        .cell(CardProduct::CashBack, CardProduct::CashBack)
        .unwrap();
    assert_eq!(diagonal.level, OpportunityLevel::None);

    let southwest = sample::records(&SelectionFilter::new().regions([Region::Southwest]));
    let narrowed = cross_sell_matrix(&southwest);
    assert_eq!(
        narrowed
            .cell(CardProduct::CashBack, CardProduct::TravelRewards)
            .unwrap()
            .level,
        OpportunityLevel::Low
    );

    let top = revenue_opportunities(&all, 3);
    assert_eq!(top.len(), 3);
    assert_eq!(
        (top[0].from, top[0].to),
        (CardProduct::CashBack, CardProduct::TravelRewards)
    );
}
