//! # Dashboard Orchestrator
//!
//! Drives one fetch cycle per mount or period change and exposes a single coherent
//! `FetchState` to whatever renders it.
//!
//! A cycle acquires a fresh credential, then requests the dashboard and analytics
//! snapshots for the same period concurrently. Both must succeed for the cycle to
//! become `Ready`; any failure aborts the whole cycle into `Failed`.
//!
//! Cycles may overlap (the user changes period while a request is in flight). Each
//! cycle is tagged with a generation number at launch, and its result is applied only
//! if no newer cycle has been started since. Results therefore land in
//! most-recently-requested order, never most-recently-completed order.

use crate::error::OrchestratorError;
use api_client::{CredentialProvider, VendorApi};
use chrono::Utc;
use core_types::{Period, SnapshotPair};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

pub mod error;
pub mod state;

pub use state::{CycleOutcome, CycleTicket, FetchState};

/// Generation bookkeeping. Guarded by one mutex so that "is this still the latest
/// cycle?" and "publish its result" happen as one step. The lock is never held
/// across an await.
#[derive(Debug)]
struct CycleBook {
    latest: u64,
    period: Period,
}

/// The single owner of `FetchState`.
pub struct DashboardOrchestrator {
    api: Arc<dyn VendorApi>,
    credentials: Arc<dyn CredentialProvider>,
    book: Mutex<CycleBook>,
    state_tx: watch::Sender<FetchState>,
}

impl DashboardOrchestrator {
    /// Creates an idle orchestrator with `period` preselected.
    pub fn new(
        api: Arc<dyn VendorApi>,
        credentials: Arc<dyn CredentialProvider>,
        period: Period,
    ) -> Self {
        let (state_tx, _) = watch::channel(FetchState::Idle);
        Self {
            api,
            credentials,
            book: Mutex::new(CycleBook { latest: 0, period }),
            state_tx,
        }
    }

    /// A receiver that observes every published state transition.
    pub fn subscribe(&self) -> watch::Receiver<FetchState> {
        self.state_tx.subscribe()
    }

    /// The current state.
    pub fn state(&self) -> FetchState {
        self.state_tx.borrow().clone()
    }

    /// The snapshot pair of the current `Ready` state, for export.
    pub fn snapshot(&self) -> Option<Arc<SnapshotPair>> {
        self.state_tx.borrow().snapshot().cloned()
    }

    /// The currently selected period.
    pub fn period(&self) -> Period {
        self.book().period
    }

    /// The generation of the most recently started cycle (0 before the first).
    pub fn generation(&self) -> u64 {
        self.book().latest
    }

    /// Runs the first cycle with the preselected period. Does nothing once any cycle
    /// has been started.
    pub async fn mount(&self) -> Option<CycleOutcome> {
        let ticket = self.begin_mount()?;
        Some(self.run_cycle(ticket).await)
    }

    /// Selects a new period and loads it.
    pub async fn set_period(&self, period: Period) -> CycleOutcome {
        self.load_cycle(period).await
    }

    /// Reloads the currently selected period.
    pub async fn retry(&self) -> CycleOutcome {
        let ticket = self.begin_cycle(None);
        self.run_cycle(ticket).await
    }

    /// Runs one complete fetch cycle for `period`.
    ///
    /// When this returns, the cycle's own result is either the visible state (`Ready` or
    /// `Failed`) or has been discarded because a newer cycle was started meanwhile.
    /// Nothing is retried automatically.
    pub async fn load_cycle(&self, period: Period) -> CycleOutcome {
        let ticket = self.begin_cycle(Some(period));
        self.run_cycle(ticket).await
    }

    /// Registers a new cycle and publishes `Loading`, without fetching anything yet.
    ///
    /// The generation is issued here, so the order of `begin_*` calls is the order in
    /// which requests win. Callers that hand the fetch to `tokio::spawn` must begin
    /// the cycle before spawning. `None` reloads the currently selected period.
    pub fn begin_cycle(&self, period: Option<Period>) -> CycleTicket {
        let mut book = self.book();
        self.issue(&mut book, period)
    }

    /// Like `begin_cycle` with the preselected period, but only if no cycle has been
    /// started yet.
    pub fn begin_mount(&self) -> Option<CycleTicket> {
        let mut book = self.book();
        if book.latest > 0 {
            return None;
        }
        Some(self.issue(&mut book, None))
    }

    /// Fetches the pair for a begun cycle and applies it if the cycle is still the latest.
    pub async fn run_cycle(&self, ticket: CycleTicket) -> CycleOutcome {
        tracing::info!(
            generation = ticket.generation,
            period = %ticket.period,
            "Starting fetch cycle."
        );
        let result = self.fetch_pair(ticket).await;
        self.finish_cycle(ticket, result)
    }

    fn book(&self) -> MutexGuard<'_, CycleBook> {
        self.book.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn issue(&self, book: &mut CycleBook, period: Option<Period>) -> CycleTicket {
        book.latest += 1;
        if let Some(period) = period {
            book.period = period;
        }
        let period = book.period;
        // Loading replaces whatever was shown before, including a previous snapshot.
        self.state_tx.send_replace(FetchState::Loading { period });
        CycleTicket {
            generation: book.latest,
            period,
        }
    }

    async fn fetch_pair(&self, ticket: CycleTicket) -> Result<SnapshotPair, OrchestratorError> {
        let CycleTicket { generation, period } = ticket;
        // The credential must exist before any data request goes out.
        let credential = self.credentials.credential().await?;
        tracing::debug!(
            generation,
            provider = self.credentials.name(),
            subject = %credential.subject,
            "Credential acquired."
        );

        let (dashboard, analytics) = futures::future::try_join(
            self.api.fetch_dashboard(&credential, period),
            self.api.fetch_analytics(&credential, period),
        )
        .await?;

        ensure_period("dashboard", period, dashboard.period)?;
        ensure_period("analytics", period, analytics.period)?;

        Ok(SnapshotPair {
            generation,
            period,
            fetched_at: Utc::now(),
            dashboard,
            analytics,
        })
    }

    fn finish_cycle(
        &self,
        ticket: CycleTicket,
        result: Result<SnapshotPair, OrchestratorError>,
    ) -> CycleOutcome {
        let CycleTicket { generation, period } = ticket;
        let book = self.book();
        if book.latest != generation {
            tracing::debug!(
                generation,
                latest = book.latest,
                %period,
                "Discarding result of superseded fetch cycle."
            );
            return CycleOutcome::Superseded {
                generation,
                latest: book.latest,
            };
        }

        let state = match result {
            Ok(pair) => {
                tracing::info!(
                    generation,
                    %period,
                    recent_orders = pair.dashboard.recent_orders.len(),
                    top_products = pair.analytics.top_products.len(),
                    "Fetch cycle ready."
                );
                FetchState::Ready(Arc::new(pair))
            }
            Err(e) => {
                tracing::warn!(generation, %period, error = %e, "Fetch cycle failed.");
                FetchState::Failed {
                    period,
                    reason: e.to_string(),
                }
            }
        };

        self.state_tx.send_replace(state.clone());
        CycleOutcome::Applied(state)
    }
}

fn ensure_period(
    source_name: &'static str,
    expected: Period,
    echoed: Option<Period>,
) -> Result<(), OrchestratorError> {
    match echoed {
        Some(actual) if actual != expected => Err(OrchestratorError::PeriodMismatch {
            source_name,
            expected,
            actual,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests;
