//! HTTP scenarios: `/place-bets` end to end over a fake session.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use paddock::api::build_router;
use paddock::api::routes::ServiceState;
use paddock::config::TimingConfig;
use paddock::engine::Orchestrator;

use crate::fake_surface::{FakeLauncher, FakeSurface};

const RACE_URL: &str =
    "https://www.unibet.fr/turf/race/17-05-2025-R4-C10-lyon-parilly-prix-dabrest.html";

fn app(launcher: Arc<FakeLauncher>) -> axum::Router {
    app_with_timing(launcher, TimingConfig::immediate())
}

fn app_with_timing(launcher: Arc<FakeLauncher>, timing: TimingConfig) -> axum::Router {
    build_router(Arc::new(ServiceState::new(launcher, Orchestrator::new(timing))))
}

fn place_bets_request(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/place-bets")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn post(app: axum::Router, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let resp = app.oneshot(place_bets_request(body)).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 100_000).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_place_bets_runs_batch_and_closes_session() {
    let launcher = Arc::new(FakeLauncher::new(FakeSurface::race(8, "100,00 €")));
    let (status, json) = post(
        app(launcher.clone()),
        serde_json::json!({
            "race_url": RACE_URL,
            "recommendations": [
                {"horse_number": 5, "horse_name": "KSAR LUDOIS", "bet_type": "win",
                 "bet_percentage": 0.05, "race_id": "R4C10"},
                {"horse_number": 99, "horse_name": "GHOST", "bet_type": "place",
                 "bet_amount": 2.0},
                {"horse_number": 3, "horse_name": "IDEAL", "bet_type": "boulet",
                 "bet_amount": 1}
            ],
            "summary": {"total_bets": 3, "win_bets": 1, "place_bets": 1, "boulot_bets": 1}
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(launcher.was_closed());
    assert_eq!(*launcher.launched_urls.lock().unwrap(), vec![RACE_URL.to_string()]);

    let outcomes = json["outcomes"].as_array().unwrap();
    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0]["status"], "PLACED");
    assert_eq!(outcomes[0]["resolved_stake"], 5.0);
    assert_eq!(outcomes[1]["status"], "FAILED");
    assert_eq!(outcomes[2]["status"], "PLACED");
    assert_eq!(json["total_staked"], 6.0);
    assert_eq!(json["account_balance"], 100.0);

    let modes: Vec<Option<String>> = launcher.surface.placed().into_iter().map(|s| s.mode).collect();
    assert_eq!(modes, vec![Some("Gagnant".into()), Some("Boulet".into())]);
}

#[tokio::test]
async fn test_unreadable_balance_is_bad_gateway_and_still_closes() {
    let page = FakeSurface::race(3, "").without_balance_element(&[]);
    let launcher = Arc::new(FakeLauncher::new(page));
    let (status, json) = post(
        app(launcher.clone()),
        serde_json::json!({
            "race_url": RACE_URL,
            "recommendations": [
                {"horse_number": 1, "horse_name": "A", "bet_type": "win", "bet_amount": 2}
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["kind"], "balance_unavailable");
    assert!(launcher.was_closed());
    assert!(launcher.surface.placed().is_empty());
}

#[tokio::test]
async fn test_non_http_race_url_rejected() {
    let launcher = Arc::new(FakeLauncher::new(FakeSurface::race(3, "10 €")));
    let (status, _) = post(
        app(launcher.clone()),
        serde_json::json!({"race_url": "file:///etc/passwd", "recommendations": []}),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(launcher.launched_urls.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_client_disconnect_lets_batch_finish_and_close() {
    let launcher = Arc::new(FakeLauncher::new(FakeSurface::race(4, "100,00 €")));
    let timing = TimingConfig {
        pacing_ms: 3_000,
        ..TimingConfig::immediate()
    };
    let request = place_bets_request(serde_json::json!({
        "race_url": RACE_URL,
        "recommendations": [
            {"horse_number": 1, "horse_name": "A", "bet_type": "win", "bet_amount": 2},
            {"horse_number": 2, "horse_name": "B", "bet_type": "win", "bet_amount": 2}
        ]
    }));

    // The caller gives up during the pacing delay after the first wager.
    let in_flight = app_with_timing(launcher.clone(), timing).oneshot(request);
    assert!(tokio::time::timeout(Duration::from_secs(1), in_flight)
        .await
        .is_err());
    assert_eq!(launcher.surface.placed().len(), 1);
    assert!(!launcher.was_closed());

    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(launcher.surface.placed().len(), 2);
    assert!(launcher.was_closed());
}
