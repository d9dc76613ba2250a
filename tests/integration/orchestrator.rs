//! Batch scenarios: the orchestrator driving the fake race page.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use paddock::config::TimingConfig;
use paddock::engine::Orchestrator;
use paddock::types::{Batch, Category, Stake, WagerError, WagerRequest, WagerStatus};

use crate::fake_surface::{FakeSurface, PlacedSlip};

fn orchestrator() -> Orchestrator {
    Orchestrator::new(TimingConfig::immediate())
}

fn wager(number: u32, category: Category, stake: Stake) -> WagerRequest {
    WagerRequest::new(Some(number), format!("Runner {number}"), category, stake)
}

#[tokio::test]
async fn test_mixed_batch_places_and_fails_in_order() {
    let page = FakeSurface::race(8, "100,00 €");
    let batch = Batch::new(vec![
        wager(5, Category::Win, Stake::Fraction(dec!(0.05))),
        wager(99, Category::Place, Stake::Amount(dec!(2.0))),
    ]);

    let result = orchestrator().run(&page, &batch).await.unwrap();

    assert_eq!(result.account_balance, dec!(100));
    assert_eq!(result.outcomes.len(), 2);

    assert_eq!(result.outcomes[0].status, WagerStatus::Placed);
    assert_eq!(result.outcomes[0].resolved_stake, dec!(5));
    assert!(result.outcomes[0].error_detail.is_none());

    assert_eq!(result.outcomes[1].status, WagerStatus::Failed);
    assert_eq!(
        result.outcomes[1].error_detail.as_deref(),
        Some("competitor not found")
    );

    assert_eq!(result.total_staked, dec!(5));
    assert_eq!(
        page.placed(),
        vec![PlacedSlip {
            mode: Some("Gagnant".into()),
            row: 4,
            stake: "5".into(),
        }]
    );
}

#[tokio::test]
async fn test_failures_are_isolated_and_order_preserved() {
    let page = FakeSurface::race(10, "200,00 €").with_broken_row(2);
    let batch = Batch::new(vec![
        wager(1, Category::Win, Stake::Amount(dec!(2))),
        wager(3, Category::Win, Stake::Amount(dec!(2))), // icons never render
        wager(42, Category::Place, Stake::Amount(dec!(2))), // not running
        WagerRequest::new(None, "Unnumbered", Category::Place, Stake::Amount(dec!(2))),
        wager(7, Category::Deuzio, Stake::Fraction(dec!(0.025))),
    ]);

    let result = orchestrator().run(&page, &batch).await.unwrap();

    let statuses: Vec<WagerStatus> = result.outcomes.iter().map(|o| o.status).collect();
    assert_eq!(
        statuses,
        vec![
            WagerStatus::Placed,
            WagerStatus::Failed,
            WagerStatus::Failed,
            WagerStatus::Skipped,
            WagerStatus::Placed,
        ]
    );
    for (outcome, request) in result.outcomes.iter().zip(batch.iter()) {
        assert_eq!(&outcome.request, request);
    }

    assert!(result.outcomes[1]
        .error_detail
        .as_deref()
        .unwrap()
        .starts_with("bet icon not clickable"));
    assert_eq!(
        result.outcomes[3].error_detail.as_deref(),
        Some("missing competitor number")
    );

    // 2.5% of 200 = 5
    assert_eq!(result.outcomes[4].resolved_stake, dec!(5));
    assert_eq!(result.total_staked, dec!(7));
    assert_eq!((result.placed(), result.failed(), result.skipped()), (2, 2, 1));

    let rows: Vec<usize> = page.placed().iter().map(|s| s.row).collect();
    assert_eq!(rows, vec![0, 6]);
}

#[tokio::test]
async fn test_mode_switches_only_when_category_changes() {
    let page = FakeSurface::race(6, "50 €");
    let batch = Batch::new(vec![
        wager(1, Category::Win, Stake::Amount(dec!(1))),
        wager(2, Category::Win, Stake::Amount(dec!(1))),
        wager(3, Category::Place, Stake::Amount(dec!(1))),
        wager(4, Category::Place, Stake::Amount(dec!(1))),
        wager(5, Category::Win, Stake::Amount(dec!(1))),
        wager(6, Category::Boulet, Stake::Amount(dec!(1))),
    ]);

    let result = orchestrator().run(&page, &batch).await.unwrap();
    assert_eq!(result.placed(), 6);
    assert_eq!(page.mode_switches(), 4);

    let modes: Vec<String> = page
        .placed()
        .into_iter()
        .map(|s| s.mode.unwrap_or_default())
        .collect();
    assert_eq!(
        modes,
        vec!["Gagnant", "Gagnant", "Placé", "Placé", "Gagnant", "Boulet"]
    );
}

#[tokio::test]
async fn test_percentage_stakes_use_the_opening_balance() {
    let page = FakeSurface::race(4, "100,00 €");
    let batch = Batch::new(vec![
        wager(1, Category::Win, Stake::Fraction(dec!(0.1))),
        wager(2, Category::Win, Stake::Fraction(dec!(0.1))),
        wager(3, Category::Win, Stake::Fraction(dec!(0.1))),
    ]);

    let result = orchestrator().run(&page, &batch).await.unwrap();
    let stakes: Vec<Decimal> = result.outcomes.iter().map(|o| o.resolved_stake).collect();
    assert_eq!(stakes, vec![dec!(10), dec!(10), dec!(10)]);
    assert_eq!(result.total_staked, dec!(30));
}

#[tokio::test]
async fn test_small_fraction_is_floored_to_minimum_stake() {
    let page = FakeSurface::race(3, "12,50 €");
    let batch = Batch::new(vec![wager(2, Category::Place, Stake::Fraction(dec!(0.01)))]);

    let result = orchestrator().run(&page, &batch).await.unwrap();
    assert_eq!(result.outcomes[0].resolved_stake, dec!(1));
    assert_eq!(page.placed()[0].stake, "1");
}

#[tokio::test]
async fn test_balance_read_from_fallback_element() {
    let page = FakeSurface::race(3, "").without_balance_element(&["Mon compte", "Solde : 250,00 €"]);
    let batch = Batch::new(vec![wager(1, Category::Win, Stake::Fraction(dec!(0.1)))]);

    let result = orchestrator().run(&page, &batch).await.unwrap();
    assert_eq!(result.account_balance, dec!(250));
    assert_eq!(result.outcomes[0].resolved_stake, dec!(25));
}

#[tokio::test]
async fn test_missing_balance_aborts_without_touching_the_card() {
    let page = FakeSurface::race(3, "").without_balance_element(&["Mon compte"]);
    let batch = Batch::new(vec![wager(1, Category::Win, Stake::Amount(dec!(2)))]);

    let err = orchestrator().run(&page, &batch).await.unwrap_err();
    assert!(matches!(err, WagerError::BalanceUnavailable(_)));
    assert!(err.is_fatal());
    assert_eq!(page.clicks(), 0);
    assert!(page.placed().is_empty());
}

#[tokio::test]
async fn test_missing_confirmation_times_out() {
    let page = FakeSurface::race(3, "20 €").without_confirmation();
    let batch = Batch::new(vec![
        wager(1, Category::Win, Stake::Amount(dec!(2))),
        wager(2, Category::Win, Stake::Amount(dec!(2))),
    ]);

    let result = orchestrator().run(&page, &batch).await.unwrap();
    assert_eq!(result.failed(), 2);
    for outcome in &result.outcomes {
        assert!(outcome
            .error_detail
            .as_deref()
            .unwrap()
            .starts_with("confirmation timed out"));
    }
    assert_eq!(result.total_staked, Decimal::ZERO);
}

#[tokio::test]
async fn test_empty_batch() {
    let page = FakeSurface::race(3, "20 €");
    let result = orchestrator().run(&page, &Batch::new(vec![])).await.unwrap();
    assert!(result.outcomes.is_empty());
    assert_eq!(result.total_staked, Decimal::ZERO);
    assert_eq!(page.clicks(), 0);
}
