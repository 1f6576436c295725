//! Engine router.
//!
//! Holds at most one live store. Transitions (initialize, set, close) are
//! serialised by a transition lock; readers clone the current handle under a
//! short read lock, so they see either the old store or the new one and
//! never a half-built state. A superseded store is closed only after its
//! replacement is installed and the calls already running on it have
//! finished, bounded by [`DRAIN_TIMEOUT`].

use crate::traits::{AdapterFactory, AttendanceGateway, AttendanceStore, ConnectionInfo};
use async_trait::async_trait;
use clockwork_config::ConnectionDescriptor;
use clockwork_core::{
    parse_iso_date, ClockworkError, ClockworkResult, ListUsersRequest, PresenceAggregate, ReportAggregate,
    ReportRequest, UserRecord,
};
use shaku::Component;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// How long a superseded store may keep serving in-flight calls.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

const DRAIN_POLL: Duration = Duration::from_millis(10);

struct Active {
    store: Arc<dyn AttendanceStore>,
    descriptor: ConnectionDescriptor,
}

/// Routes the attendance contract to the current store.
#[derive(Component)]
#[shaku(interface = AttendanceGateway)]
pub struct EngineRouter {
    #[shaku(inject)]
    factory: Arc<dyn AdapterFactory>,
    #[shaku(default)]
    state: RwLock<Option<Active>>,
    #[shaku(default)]
    transition: Mutex<()>,
}

impl EngineRouter {
    /// Creates a disconnected router.
    #[must_use]
    pub fn new(factory: Arc<dyn AdapterFactory>) -> Self {
        Self {
            factory,
            state: RwLock::new(None),
            transition: Mutex::new(()),
        }
    }

    async fn current(&self) -> ClockworkResult<Arc<dyn AttendanceStore>> {
        self.state
            .read()
            .await
            .as_ref()
            .map(|active| Arc::clone(&active.store))
            .ok_or(ClockworkError::NotConfigured)
    }

    /// Connects and verifies a candidate without touching current state.
    async fn verified(&self, descriptor: &ConnectionDescriptor) -> ClockworkResult<Arc<dyn AttendanceStore>> {
        descriptor.ensure_valid()?;
        let candidate = self.factory.connect(descriptor).await?;
        if let Err(e) = candidate.ping().await {
            candidate.close().await;
            return Err(e);
        }
        Ok(candidate)
    }

    /// Swaps in a verified store. Caller holds the transition lock.
    ///
    /// New calls go to the replacement as soon as the write lock is released;
    /// the previous store is closed once its in-flight calls have returned.
    async fn install(&self, store: Arc<dyn AttendanceStore>, descriptor: ConnectionDescriptor) -> ConnectionInfo {
        let info = ConnectionInfo::from(&descriptor);
        let previous = self.state.write().await.replace(Active { store, descriptor });

        if let Some(previous) = previous {
            info!(engine = %previous.descriptor.engine, "Closing superseded connection");
            retire(previous).await;
        }
        info
    }
}

/// Waits for callers still holding the store, then closes it.
///
/// Every in-flight call owns a clone of the handle taken under the read lock,
/// so the store is idle once the router's clone is the only one left.
async fn retire(previous: Active) {
    let deadline = Instant::now() + DRAIN_TIMEOUT;
    while Arc::strong_count(&previous.store) > 1 {
        if Instant::now() >= deadline {
            warn!(
                engine = %previous.descriptor.engine,
                in_flight = Arc::strong_count(&previous.store) - 1,
                "Closing connection with calls still in flight"
            );
            break;
        }
        sleep(DRAIN_POLL).await;
    }
    debug!(engine = %previous.descriptor.engine, "Connection drained");
    previous.store.close().await;
}

#[async_trait]
impl AttendanceGateway for EngineRouter {
    async fn initialize(&self, descriptor: Option<ConnectionDescriptor>) {
        let Some(descriptor) = descriptor else {
            info!("No database connection configured; staying disconnected");
            return;
        };

        let _guard = self.transition.lock().await;
        match self.verified(&descriptor).await {
            Ok(store) => {
                let info = self.install(store, descriptor).await;
                info!(engine = %info.engine, target = %info.target, "Database connection initialized");
            }
            Err(e) => {
                warn!(engine = %descriptor.engine, error = %e, "Initial database connection failed");
            }
        }
    }

    async fn test_connection(&self, descriptor: &ConnectionDescriptor) -> ClockworkResult<()> {
        descriptor.ensure_valid()?;
        let candidate = self.factory.connect(descriptor).await?;
        let result = candidate.ping().await;
        candidate.close().await;
        result
    }

    async fn set_connection(&self, descriptor: ConnectionDescriptor) -> ClockworkResult<ConnectionInfo> {
        let _guard = self.transition.lock().await;
        let store = self.verified(&descriptor).await.map_err(|e| {
            warn!(engine = %descriptor.engine, error = %e, "Connection change rejected; keeping current connection");
            e
        })?;
        let info = self.install(store, descriptor).await;
        info!(engine = %info.engine, target = %info.target, "Database connection switched");
        Ok(info)
    }

    async fn close(&self) {
        let _guard = self.transition.lock().await;
        let previous = self.state.write().await.take();
        if let Some(previous) = previous {
            let engine = previous.descriptor.engine;
            retire(previous).await;
            info!(engine = %engine, "Database connection closed");
        }
    }

    async fn get_connection_info(&self) -> Option<ConnectionInfo> {
        self.state
            .read()
            .await
            .as_ref()
            .map(|active| ConnectionInfo::from(&active.descriptor))
    }

    async fn ping(&self) -> ClockworkResult<()> {
        self.current().await?.ping().await
    }

    async fn list_users(&self, request: &ListUsersRequest) -> ClockworkResult<Vec<UserRecord>> {
        self.current().await?.list_users(request).await
    }

    async fn build_report(&self, request: &ReportRequest) -> ClockworkResult<ReportAggregate> {
        self.current().await?.build_report(request).await
    }

    async fn get_daily_presence(&self, date: &str) -> ClockworkResult<PresenceAggregate> {
        let date = parse_iso_date("date", date)?;
        self.current().await?.get_daily_presence(date).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use clockwork_config::Engine;
    use clockwork_core::DateRangeRequest;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Notify;

    /// Holds `list_users` open until released.
    #[derive(Default)]
    struct Gate {
        entered: Notify,
        release: Notify,
    }

    /// In-memory store that counts how often it was closed.
    struct FakeStore {
        descriptor: ConnectionDescriptor,
        closes: Arc<AtomicUsize>,
        users: Vec<UserRecord>,
        gate: Option<Arc<Gate>>,
    }

    #[async_trait]
    impl AttendanceStore for FakeStore {
        fn engine(&self) -> Engine {
            self.descriptor.engine
        }

        fn descriptor(&self) -> &ConnectionDescriptor {
            &self.descriptor
        }

        async fn ping(&self) -> ClockworkResult<()> {
            Ok(())
        }

        async fn list_users(&self, _request: &ListUsersRequest) -> ClockworkResult<Vec<UserRecord>> {
            if let Some(gate) = &self.gate {
                gate.entered.notify_one();
                gate.release.notified().await;
            }
            Ok(self.users.clone())
        }

        async fn build_report(&self, _request: &ReportRequest) -> ClockworkResult<ReportAggregate> {
            Ok(ReportAggregate::empty())
        }

        async fn get_daily_presence(&self, date: NaiveDate) -> ClockworkResult<PresenceAggregate> {
            Ok(PresenceAggregate::from_punches(date, &[], date.and_hms_opt(12, 0, 0).unwrap_or_default()))
        }

        async fn close(&self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Factory keyed by database name; unknown names are refused.
    #[derive(Default)]
    struct FakeFactory {
        reachable: Vec<&'static str>,
        closes: StdMutex<HashMap<String, Arc<AtomicUsize>>>,
        gate: Option<Arc<Gate>>,
    }

    impl FakeFactory {
        fn with_reachable(reachable: Vec<&'static str>) -> Self {
            Self {
                reachable,
                ..Self::default()
            }
        }

        fn closes(&self, database: &str) -> usize {
            self.closes
                .lock()
                .unwrap()
                .get(database)
                .map_or(0, |count| count.load(Ordering::SeqCst))
        }
    }

    #[async_trait]
    impl AdapterFactory for FakeFactory {
        async fn connect(&self, descriptor: &ConnectionDescriptor) -> ClockworkResult<Arc<dyn AttendanceStore>> {
            if !self.reachable.contains(&descriptor.database.as_str()) {
                return Err(ClockworkError::ConnectionRefused(format!(
                    "{} refused the connection",
                    descriptor.address()
                )));
            }
            let closes = Arc::clone(
                self.closes
                    .lock()
                    .unwrap()
                    .entry(descriptor.database.clone())
                    .or_default(),
            );
            Ok(Arc::new(FakeStore {
                descriptor: descriptor.clone(),
                closes,
                users: vec![UserRecord::new("1", descriptor.database.clone(), None, None, None)],
                gate: self.gate.clone(),
            }))
        }
    }

    fn descriptor(database: &str) -> ConnectionDescriptor {
        ConnectionDescriptor::networked(Engine::MySql, "db", 3306, "hr", "pw", database)
    }

    fn router(reachable: Vec<&'static str>) -> (EngineRouter, Arc<FakeFactory>) {
        let factory = Arc::new(FakeFactory::with_reachable(reachable));
        (EngineRouter::new(factory.clone()), factory)
    }

    #[tokio::test]
    async fn test_operations_require_connection() {
        let (router, _) = router(vec![]);

        assert!(router.get_connection_info().await.is_none());
        assert!(matches!(router.ping().await, Err(ClockworkError::NotConfigured)));
        assert!(matches!(
            router.list_users(&ListUsersRequest::default()).await,
            Err(ClockworkError::NotConfigured)
        ));
        assert!(matches!(
            router
                .build_report(&ReportRequest::new(vec![], DateRangeRequest::Current))
                .await,
            Err(ClockworkError::NotConfigured)
        ));
        assert!(matches!(
            router.get_daily_presence("2026-10-18").await,
            Err(ClockworkError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn test_initialize_failure_is_not_fatal() {
        let (router, _) = router(vec![]);
        router.initialize(Some(descriptor("a"))).await;
        assert!(router.get_connection_info().await.is_none());

        router.initialize(None).await;
        assert!(router.get_connection_info().await.is_none());
    }

    #[tokio::test]
    async fn test_swap_closes_previous_exactly_once() {
        let (router, factory) = router(vec!["a", "b"]);
        router.initialize(Some(descriptor("a"))).await;
        assert_eq!(router.get_connection_info().await.unwrap().target, "a");

        let info = router.set_connection(descriptor("b")).await.unwrap();
        assert_eq!(info.target, "b");
        assert_eq!(
            router.get_connection_info().await,
            Some(ConnectionInfo {
                engine: Engine::MySql,
                target: "b".to_string()
            })
        );
        assert_eq!(factory.closes("a"), 1);
        assert_eq!(factory.closes("b"), 0);

        let users = router.list_users(&ListUsersRequest::default()).await.unwrap();
        assert_eq!(users[0].username, "b");
    }

    #[tokio::test]
    async fn test_swap_waits_for_in_flight_calls() {
        let gate = Arc::new(Gate::default());
        let factory = Arc::new(FakeFactory {
            gate: Some(Arc::clone(&gate)),
            ..FakeFactory::with_reachable(vec!["a", "b"])
        });
        let router = Arc::new(EngineRouter::new(factory.clone()));
        router.set_connection(descriptor("a")).await.unwrap();

        let reader = tokio::spawn({
            let router = Arc::clone(&router);
            async move { router.list_users(&ListUsersRequest::default()).await }
        });
        gate.entered.notified().await;

        let swap = tokio::spawn({
            let router = Arc::clone(&router);
            async move { router.set_connection(descriptor("b")).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(router.get_connection_info().await.unwrap().target, "b");
        assert_eq!(factory.closes("a"), 0);

        gate.release.notify_one();
        let users = reader.await.unwrap().unwrap();
        assert_eq!(users[0].username, "a");

        swap.await.unwrap().unwrap();
        assert_eq!(factory.closes("a"), 1);
        assert_eq!(factory.closes("b"), 0);
    }

    #[tokio::test]
    async fn test_failed_swap_keeps_previous() {
        let (router, factory) = router(vec!["a"]);
        router.set_connection(descriptor("a")).await.unwrap();

        let err = router.set_connection(descriptor("unreachable")).await.unwrap_err();
        assert!(matches!(err, ClockworkError::ConnectionRefused(_)));

        assert_eq!(router.get_connection_info().await.unwrap().target, "a");
        assert_eq!(factory.closes("a"), 0);
        router.ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_descriptor_is_validation_error() {
        let (router, _) = router(vec!["a"]);
        router.set_connection(descriptor("a")).await.unwrap();

        let err = router.set_connection(descriptor("")).await.unwrap_err();
        assert!(matches!(err, ClockworkError::Validation(_)));
        assert_eq!(router.get_connection_info().await.unwrap().target, "a");
    }

    #[tokio::test]
    async fn test_connection_check_always_closes() {
        let (router, factory) = router(vec!["a"]);
        router.test_connection(&descriptor("a")).await.unwrap();
        assert_eq!(factory.closes("a"), 1);
        assert!(router.get_connection_info().await.is_none());
    }

    #[tokio::test]
    async fn test_close_returns_to_disconnected() {
        let (router, factory) = router(vec!["a"]);
        router.set_connection(descriptor("a")).await.unwrap();
        router.close().await;
        router.close().await;

        assert!(router.get_connection_info().await.is_none());
        assert_eq!(factory.closes("a"), 1);
    }

    #[tokio::test]
    async fn test_presence_date_is_validated() {
        let (router, _) = router(vec!["a"]);
        router.set_connection(descriptor("a")).await.unwrap();

        let err = router.get_daily_presence("18/10/2026").await.unwrap_err();
        assert!(matches!(err, ClockworkError::Validation(_)));
        let presence = router.get_daily_presence("2026-10-18").await.unwrap();
        assert!(presence.rows.is_empty());
    }
}
