use super::*;
use api_client::{ApiError, AuthError, Credential};
use async_trait::async_trait;
use core_types::{
    AnalyticsSnapshot, CommissionPoint, DashboardSnapshot, OrderStatusFilter, RecentOrder,
    SalesPoint, TopProduct,
};
use rust_decimal_macros::dec;
use chrono::TimeZone;
use report::ExportFormat;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Endpoint {
    Dashboard,
    Analytics,
}

/// In-memory vendor API. Requests can be held back per (endpoint, period) until the
/// test releases them, which lets a test choose the completion order of overlapping cycles.
#[derive(Default)]
struct FakeApi {
    calls: AtomicUsize,
    gates: std::sync::Mutex<HashMap<(Endpoint, Period), oneshot::Receiver<()>>>,
    failing: std::sync::Mutex<Option<Endpoint>>,
    echo_override: Option<Period>,
}

impl FakeApi {
    fn hold(&self, endpoint: Endpoint, period: Period) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert((endpoint, period), rx);
        tx
    }

    fn fail(&self, endpoint: Option<Endpoint>) {
        *self.failing.lock().unwrap() = endpoint;
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self, endpoint: Endpoint, period: Period) -> Result<(), ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().unwrap().remove(&(endpoint, period));
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if *self.failing.lock().unwrap() == Some(endpoint) {
            return Err(ApiError::Http {
                status: 500,
                message: format!("{:?} backend unavailable", endpoint),
            });
        }
        Ok(())
    }
}

fn dashboard_for(period: Period) -> DashboardSnapshot {
    DashboardSnapshot {
        vendor_id: "vendor-1".to_string(),
        vendor_name: format!("Acme ({})", period),
        total_sales: dec!(1000),
        net_revenue: dec!(900),
        total_commission_paid: dec!(100),
        completed_orders: 9,
        pending_orders: 1,
        refunded_orders: 0,
        refund_rate: dec!(0),
        average_order_value: dec!(100),
        recent_orders: vec![RecentOrder {
            id: "o-1".to_string(),
            date: chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            product: "Lamp".to_string(),
            amount: dec!(100),
            status: "Completed".to_string(),
        }],
        total_transactions: Some(10),
        total_refunds: None,
        period: Some(period),
    }
}

fn analytics_for(period: Period) -> AnalyticsSnapshot {
    let date = chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    AnalyticsSnapshot {
        sales_trend: vec![SalesPoint { date, amount: dec!(100) }],
        commission_trend: vec![CommissionPoint { date, commission: dec!(10) }],
        top_products: vec![TopProduct {
            name: "Lamp".to_string(),
            revenue: dec!(100),
            orders: 1,
            quantity: 1,
        }],
        period: Some(period),
    }
}

#[async_trait]
impl VendorApi for FakeApi {
    async fn fetch_dashboard(
        &self,
        _credential: &Credential,
        period: Period,
    ) -> Result<DashboardSnapshot, ApiError> {
        self.enter(Endpoint::Dashboard, period).await?;
        Ok(dashboard_for(self.echo_override.unwrap_or(period)))
    }

    async fn fetch_analytics(
        &self,
        _credential: &Credential,
        period: Period,
    ) -> Result<AnalyticsSnapshot, ApiError> {
        self.enter(Endpoint::Analytics, period).await?;
        Ok(analytics_for(period))
    }

    async fn fetch_orders(
        &self,
        _credential: &Credential,
        _status: OrderStatusFilter,
        _limit: u32,
    ) -> Result<Vec<RecentOrder>, ApiError> {
        Ok(dashboard_for(Period::All).recent_orders)
    }
}

struct FakeCredentials {
    result: Result<(), AuthError>,
    calls: AtomicUsize,
}

impl FakeCredentials {
    fn ok() -> Self {
        Self {
            result: Ok(()),
            calls: AtomicUsize::new(0),
        }
    }

    fn failing(error: AuthError) -> Self {
        Self {
            result: Err(error),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CredentialProvider for FakeCredentials {
    async fn credential(&self) -> Result<Credential, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()?;
        Ok(Credential::new("token", "vendor-1"))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

fn orchestrator(api: &Arc<FakeApi>, credentials: FakeCredentials) -> DashboardOrchestrator {
    DashboardOrchestrator::new(api.clone(), Arc::new(credentials), Period::Month)
}

async fn wait_for_loading(rx: &mut watch::Receiver<FetchState>, period: Period) {
    rx.wait_for(|state| *state == FetchState::Loading { period })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_starts_idle_with_default_period() {
    let api = Arc::new(FakeApi::default());
    let orchestrator = orchestrator(&api, FakeCredentials::ok());

    assert_eq!(orchestrator.state(), FetchState::Idle);
    assert_eq!(orchestrator.period(), Period::Month);
    assert_eq!(orchestrator.generation(), 0);
    assert!(orchestrator.snapshot().is_none());
}

#[tokio::test]
async fn test_every_period_yields_matching_pair() {
    let api = Arc::new(FakeApi::default());
    let orchestrator = orchestrator(&api, FakeCredentials::ok());

    for period in Period::ALL {
        let outcome = orchestrator.set_period(period).await;
        assert!(outcome.is_applied());

        let pair = orchestrator.snapshot().expect("ready snapshot");
        assert_eq!(pair.period, period);
        assert_eq!(pair.dashboard.period, Some(period));
        assert_eq!(pair.analytics.period, Some(period));
        assert_eq!(orchestrator.period(), period);
    }
    assert_eq!(orchestrator.generation(), 4);
}

#[tokio::test]
async fn test_later_request_wins_even_when_earlier_finishes_last() {
    let api = Arc::new(FakeApi::default());
    let release_week = api.hold(Endpoint::Dashboard, Period::Week);
    let orchestrator = orchestrator(&api, FakeCredentials::ok());
    let mut rx = orchestrator.subscribe();

    let (first, second) = tokio::join!(orchestrator.load_cycle(Period::Week), async {
        wait_for_loading(&mut rx, Period::Week).await;
        let outcome = orchestrator.load_cycle(Period::Quarter).await;
        // Only now let the stale week cycle complete.
        release_week.send(()).unwrap();
        outcome
    });

    assert_eq!(
        first,
        CycleOutcome::Superseded {
            generation: 1,
            latest: 2
        }
    );
    assert!(second.is_applied());

    let pair = orchestrator.snapshot().expect("ready snapshot");
    assert_eq!(pair.period, Period::Quarter);
    assert_eq!(pair.generation, 2);
    assert_eq!(orchestrator.state().period(), Some(Period::Quarter));
}

#[tokio::test]
async fn test_stale_failure_does_not_override_newer_ready() {
    let api = Arc::new(FakeApi::default());
    let release_week = api.hold(Endpoint::Analytics, Period::Week);
    let orchestrator = orchestrator(&api, FakeCredentials::ok());
    let mut rx = orchestrator.subscribe();

    let (first, _) = tokio::join!(orchestrator.load_cycle(Period::Week), async {
        wait_for_loading(&mut rx, Period::Week).await;
        orchestrator.load_cycle(Period::Month).await;
        api.fail(Some(Endpoint::Analytics));
        release_week.send(()).unwrap();
    });

    assert!(!first.is_applied());
    assert!(matches!(orchestrator.state(), FetchState::Ready(ref pair) if pair.period == Period::Month));
}

#[tokio::test]
async fn test_credential_failure_issues_no_requests() {
    let api = Arc::new(FakeApi::default());
    let orchestrator = orchestrator(&api, FakeCredentials::failing(AuthError::MissingToken));

    let outcome = orchestrator.load_cycle(Period::Week).await;

    assert_eq!(api.calls(), 0);
    match outcome.state() {
        Some(FetchState::Failed { period, reason }) => {
            assert_eq!(*period, Period::Week);
            assert!(reason.contains("access token is required"), "{reason}");
        }
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_one_failed_request_fails_whole_cycle() {
    for endpoint in [Endpoint::Dashboard, Endpoint::Analytics] {
        let api = Arc::new(FakeApi::default());
        api.fail(Some(endpoint));
        let orchestrator = orchestrator(&api, FakeCredentials::ok());
        let mut rx = orchestrator.subscribe();

        let observer = tokio::spawn(async move {
            let mut seen = Vec::new();
            while rx.changed().await.is_ok() {
                let state = rx.borrow_and_update().clone();
                let settled = state.is_settled();
                seen.push(state);
                if settled {
                    break;
                }
            }
            seen
        });

        orchestrator.load_cycle(Period::Month).await;
        let seen = observer.await.unwrap();

        assert!(seen.iter().all(|state| !matches!(state, FetchState::Ready(_))));
        assert_eq!(
            orchestrator.state(),
            FetchState::Failed {
                period: Period::Month,
                reason: format!("{:?} backend unavailable", endpoint),
            }
        );
        assert!(orchestrator.snapshot().is_none());
    }
}

#[tokio::test]
async fn test_loading_clears_previous_snapshot() {
    let api = Arc::new(FakeApi::default());
    let orchestrator = orchestrator(&api, FakeCredentials::ok());
    orchestrator.load_cycle(Period::Month).await;
    assert!(orchestrator.snapshot().is_some());

    let release = api.hold(Endpoint::Dashboard, Period::Week);
    let mut rx = orchestrator.subscribe();

    let (outcome, _) = tokio::join!(orchestrator.set_period(Period::Week), async {
        wait_for_loading(&mut rx, Period::Week).await;
        assert!(orchestrator.snapshot().is_none());
        assert!(orchestrator.state().is_loading());
        release.send(()).unwrap();
    });

    assert!(outcome.is_applied());
    assert_eq!(orchestrator.snapshot().unwrap().period, Period::Week);
}

#[tokio::test]
async fn test_retry_recovers_after_failure() {
    let api = Arc::new(FakeApi::default());
    api.fail(Some(Endpoint::Dashboard));
    let orchestrator = orchestrator(&api, FakeCredentials::ok());

    orchestrator.set_period(Period::Quarter).await;
    assert!(matches!(orchestrator.state(), FetchState::Failed { .. }));

    api.fail(None);
    let outcome = orchestrator.retry().await;

    assert!(outcome.is_applied());
    let pair = orchestrator.snapshot().unwrap();
    assert_eq!(pair.period, Period::Quarter);
    assert_eq!(pair.generation, 2);
}

#[tokio::test]
async fn test_mismatched_echoed_period_is_failure() {
    let api = Arc::new(FakeApi {
        echo_override: Some(Period::All),
        ..FakeApi::default()
    });
    let orchestrator = orchestrator(&api, FakeCredentials::ok());

    orchestrator.load_cycle(Period::Week).await;

    match orchestrator.state() {
        FetchState::Failed { reason, .. } => {
            assert!(reason.contains("dashboard"), "{reason}");
            assert!(reason.contains("'all'"), "{reason}");
        }
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_mount_runs_only_once() {
    let api = Arc::new(FakeApi::default());
    let credentials = FakeCredentials::ok();
    let orchestrator = orchestrator(&api, credentials);

    let first = orchestrator.mount().await;
    assert!(matches!(first, Some(CycleOutcome::Applied(FetchState::Ready(_)))));
    assert_eq!(orchestrator.snapshot().unwrap().period, Period::Month);

    assert!(orchestrator.mount().await.is_none());
    assert_eq!(orchestrator.generation(), 1);
}

#[tokio::test]
async fn test_fresh_credential_per_cycle() {
    let api = Arc::new(FakeApi::default());
    let credentials = Arc::new(FakeCredentials::ok());
    let orchestrator =
        DashboardOrchestrator::new(api.clone(), credentials.clone(), Period::Month);

    orchestrator.retry().await;
    orchestrator.retry().await;

    assert_eq!(credentials.calls.load(Ordering::SeqCst), 2);
    assert_eq!(api.calls(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_spawned_cycles_keep_request_order() {
    for _ in 0..200 {
        let api = Arc::new(FakeApi::default());
        let orchestrator = Arc::new(orchestrator(&api, FakeCredentials::ok()));

        let week = orchestrator.begin_cycle(Some(Period::Week));
        let quarter = orchestrator.begin_cycle(Some(Period::Quarter));
        let first = tokio::spawn({
            let orchestrator = orchestrator.clone();
            async move { orchestrator.run_cycle(week).await }
        });
        let second = tokio::spawn({
            let orchestrator = orchestrator.clone();
            async move { orchestrator.run_cycle(quarter).await }
        });

        let first = first.await.unwrap();
        second.await.unwrap();

        assert!(!first.is_applied());
        assert_eq!(orchestrator.state().period(), Some(Period::Quarter));
        assert_eq!(orchestrator.snapshot().unwrap().generation, 2);
    }
}

#[tokio::test]
async fn test_retry_begun_after_period_change_uses_new_period() {
    let api = Arc::new(FakeApi::default());
    let orchestrator = orchestrator(&api, FakeCredentials::ok());

    let change = orchestrator.begin_cycle(Some(Period::Week));
    let retry = orchestrator.begin_cycle(None);

    assert_eq!(change, CycleTicket { generation: 1, period: Period::Week });
    assert_eq!(retry, CycleTicket { generation: 2, period: Period::Week });
    assert_eq!(
        orchestrator.state(),
        FetchState::Loading { period: Period::Week }
    );

    assert!(!orchestrator.run_cycle(change).await.is_applied());
    assert!(orchestrator.run_cycle(retry).await.is_applied());
    assert_eq!(orchestrator.snapshot().unwrap().period, Period::Week);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_mounts_start_one_cycle() {
    let api = Arc::new(FakeApi::default());
    let orchestrator = Arc::new(orchestrator(&api, FakeCredentials::ok()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.mount().await })
        })
        .collect();

    let mut started = 0;
    for handle in handles {
        if handle.await.unwrap().is_some() {
            started += 1;
        }
    }

    assert_eq!(started, 1);
    assert_eq!(orchestrator.generation(), 1);
    assert_eq!(api.calls(), 2);
}

#[tokio::test]
async fn test_repeated_retry_exports_identical_json() {
    let api = Arc::new(FakeApi::default());
    let orchestrator = orchestrator(&api, FakeCredentials::ok());
    let generated_at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

    orchestrator.retry().await;
    let first = orchestrator.snapshot().unwrap();
    orchestrator.retry().await;
    let second = orchestrator.snapshot().unwrap();
    assert_ne!(first.generation, second.generation);

    let first = report::export(Some(&first), ExportFormat::Json, generated_at).unwrap();
    let second = report::export(Some(&second), ExportFormat::Json, generated_at).unwrap();
    assert_eq!(first, second);
}
