//! Boundary with the paginated stores that supply events and backlog
//! snapshots. Both fetches run concurrently; the engine runs once both finish.

use crate::engine::ReportEngine;
use crate::error::{DeliveryChangeError, Result};
use crate::report::Report;
use crate::schema::{BacklogSnapshotEntry, ChangeEvent};
use futures::future::BoxFuture;
use log::warn;

pub trait EventSource: Send + Sync {
    fn fetch_events(&self, fiscal_period: i32) -> BoxFuture<'_, Result<Vec<ChangeEvent>>>;
}

pub trait SnapshotSource: Send + Sync {
    fn fetch_snapshots(
        &self,
        fiscal_period: i32,
    ) -> BoxFuture<'_, Result<Vec<BacklogSnapshotEntry>>>;
}

/// Fetches both inputs concurrently and computes the report.
///
/// An event-source failure is returned to the caller. A failing or missing
/// snapshot source yields a report with zero backlog (and zero rates).
pub async fn fetch_and_compute(
    engine: &ReportEngine,
    fiscal_period: i32,
    events: &dyn EventSource,
    snapshots: Option<&dyn SnapshotSource>,
) -> Result<Report> {
    let snapshot_fetch = async {
        match snapshots {
            Some(source) => source.fetch_snapshots(fiscal_period).await,
            None => Ok(Vec::new()),
        }
    };

    let (events, snapshots) = futures::join!(events.fetch_events(fiscal_period), snapshot_fetch);

    let events = events.map_err(|e| match e {
        DeliveryChangeError::EventSourceUnavailable(_) => e,
        other => DeliveryChangeError::EventSourceUnavailable(other.to_string()),
    })?;

    let snapshots = snapshots.unwrap_or_else(|e| {
        warn!(
            "Snapshot source failed for period {}, continuing with zero backlog: {}",
            fiscal_period, e
        );
        Vec::new()
    });

    engine.compute(fiscal_period, &events, &snapshots)
}

/// In-memory source, mainly for callers that already hold the data.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    pub events: Vec<ChangeEvent>,
    pub snapshots: Vec<BacklogSnapshotEntry>,
}

impl EventSource for StaticSource {
    fn fetch_events(&self, _fiscal_period: i32) -> BoxFuture<'_, Result<Vec<ChangeEvent>>> {
        Box::pin(async move { Ok(self.events.clone()) })
    }
}

impl SnapshotSource for StaticSource {
    fn fetch_snapshots(
        &self,
        _fiscal_period: i32,
    ) -> BoxFuture<'_, Result<Vec<BacklogSnapshotEntry>>> {
        Box::pin(async move { Ok(self.snapshots.clone()) })
    }
}
