//! Capability interfaces.

use async_trait::async_trait;
use chrono::NaiveDate;
use clockwork_config::{ConnectionDescriptor, Engine};
use clockwork_core::{
    ClockworkResult, Interface, ListUsersRequest, PresenceAggregate, ReportAggregate, ReportRequest, UserRecord,
};
use serde::Serialize;
use std::sync::Arc;

/// One connected backing store.
///
/// There are exactly four implementations, one per engine family. The router
/// holds one of them behind `Arc<dyn AttendanceStore>`.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Engine this store talks to.
    fn engine(&self) -> Engine;

    /// Descriptor the store was connected with.
    fn descriptor(&self) -> &ConnectionDescriptor;

    /// Re-runs the liveness query.
    async fn ping(&self) -> ClockworkResult<()>;

    /// Directory lookup, optionally filtered.
    async fn list_users(&self, request: &ListUsersRequest) -> ClockworkResult<Vec<UserRecord>>;

    /// Historical report over a resolved date range.
    async fn build_report(&self, request: &ReportRequest) -> ClockworkResult<ReportAggregate>;

    /// Live single-day snapshot.
    async fn get_daily_presence(&self, date: NaiveDate) -> ClockworkResult<PresenceAggregate>;

    /// Releases the pool. Safe to call more than once.
    async fn close(&self);
}

/// Builds connected stores from descriptors.
#[async_trait]
pub trait AdapterFactory: Interface {
    /// Opens a pool for `descriptor` and runs the liveness query.
    ///
    /// Any partially opened resource is released before an error is returned.
    async fn connect(&self, descriptor: &ConnectionDescriptor) -> ClockworkResult<Arc<dyn AttendanceStore>>;
}

/// What the router is connected to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    pub engine: Engine,
    /// Database name, or file path for the embedded engine.
    pub target: String,
}

impl From<&ConnectionDescriptor> for ConnectionInfo {
    fn from(descriptor: &ConnectionDescriptor) -> Self {
        Self {
            engine: descriptor.engine,
            target: descriptor.target(),
        }
    }
}

/// Engine-agnostic entry point.
#[async_trait]
pub trait AttendanceGateway: Interface {
    /// Connects at startup. Failures are logged and leave the gateway disconnected.
    async fn initialize(&self, descriptor: Option<ConnectionDescriptor>);

    /// Connects and pings a throwaway store, always closing it afterwards.
    async fn test_connection(&self, descriptor: &ConnectionDescriptor) -> ClockworkResult<()>;

    /// Verifies a new store and swaps it in, closing the old one afterwards.
    async fn set_connection(&self, descriptor: ConnectionDescriptor) -> ClockworkResult<ConnectionInfo>;

    /// Closes the current store, if any.
    async fn close(&self);

    /// Current engine and target, if connected.
    async fn get_connection_info(&self) -> Option<ConnectionInfo>;

    async fn ping(&self) -> ClockworkResult<()>;

    async fn list_users(&self, request: &ListUsersRequest) -> ClockworkResult<Vec<UserRecord>>;

    async fn build_report(&self, request: &ReportRequest) -> ClockworkResult<ReportAggregate>;

    /// Presence for an ISO `YYYY-MM-DD` date.
    async fn get_daily_presence(&self, date: &str) -> ClockworkResult<PresenceAggregate>;
}
