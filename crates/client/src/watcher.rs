//! Session liveness watcher.
//!
//! One background task per authenticated view, racing two timers:
//! - an idle deadline, pushed back by (throttled) user activity
//! - a backend poll that re-validates the session
//!
//! Either one ending the session goes through [`SessionLifecycle::force_logout`].
//! A slow backend check never holds up the idle deadline.

use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use bizops_auth::{AppRoute, ClientStorage};

use crate::check::{SessionCheck, SessionCheckError, SessionStatus};
use crate::lifecycle::{LogoutReason, SessionLifecycle};

/// Kinds of user activity that count as "still here".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityEvent {
    Pointer,
    Key,
    Scroll,
    Touch,
    Focus,
}

impl ActivityEvent {
    pub const ALL: [ActivityEvent; 5] = [
        ActivityEvent::Pointer,
        ActivityEvent::Key,
        ActivityEvent::Scroll,
        ActivityEvent::Touch,
        ActivityEvent::Focus,
    ];

    /// DOM event names mapped to this activity kind.
    pub fn dom_events(&self) -> &'static [&'static str] {
        match self {
            ActivityEvent::Pointer => &["mousedown", "mousemove", "click"],
            ActivityEvent::Key => &["keydown", "keypress"],
            ActivityEvent::Scroll => &["scroll", "wheel"],
            ActivityEvent::Touch => &["touchstart", "touchmove"],
            ActivityEvent::Focus => &["focus"],
        }
    }

    pub fn from_dom_event(name: &str) -> Option<Self> {
        ActivityEvent::ALL
            .into_iter()
            .find(|kind| kind.dom_events().contains(&name))
    }
}

/// Timer settings for the watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessConfig {
    /// Inactivity after which the session is ended.
    pub idle_timeout: Duration,
    /// Interval between backend session checks.
    pub poll_interval: Duration,
    /// Minimum spacing between forwarded activity events.
    pub activity_throttle: Duration,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(30 * 60),
            poll_interval: Duration::from_secs(5 * 60),
            activity_throttle: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WatchError {
    #[error("no authenticated session to watch")]
    NotAuthenticated,

    #[error("session is not watched on auth page {0}")]
    AuthPage(AppRoute),
}

/// How a watcher task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchExit {
    /// Stopped by its handle or by a logout from elsewhere.
    Stopped,
    /// The watcher itself ended the session.
    LoggedOut(LogoutReason),
}

/// Throttled sender of activity events to a running watcher.
#[derive(Debug, Clone)]
pub struct ActivityReporter {
    tx: mpsc::UnboundedSender<ActivityEvent>,
    last_forwarded: Arc<Mutex<Option<Instant>>>,
    throttle: Duration,
}

impl ActivityReporter {
    /// Report user activity.
    ///
    /// Returns `true` if the event was forwarded, `false` if it was coalesced
    /// into a recent one or the watcher is gone.
    pub fn record(&self, event: ActivityEvent) -> bool {
        let now = Instant::now();
        let mut last = self
            .last_forwarded
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if last.is_some_and(|prev| now.duration_since(prev) < self.throttle) {
            return false;
        }
        if self.tx.send(event).is_err() {
            return false;
        }
        *last = Some(now);
        true
    }
}

/// Background session watcher.
pub struct SessionWatcher<S, C: ?Sized> {
    lifecycle: Arc<SessionLifecycle<S>>,
    checker: Arc<C>,
    config: LivenessConfig,
}

impl<S, C> SessionWatcher<S, C>
where
    S: ClientStorage + 'static,
    C: SessionCheck + ?Sized + 'static,
{
    pub fn new(
        lifecycle: Arc<SessionLifecycle<S>>,
        checker: Arc<C>,
        config: LivenessConfig,
    ) -> Self {
        Self {
            lifecycle,
            checker,
            config,
        }
    }

    /// Start watching while `route` is displayed.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self, route: AppRoute) -> Result<WatcherHandle, WatchError> {
        if route.is_auth_page() {
            return Err(WatchError::AuthPage(route));
        }
        if !self.lifecycle.is_authenticated() {
            return Err(WatchError::NotAuthenticated);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let shutdown = Arc::new(Notify::new());
        let reporter = ActivityReporter {
            tx,
            last_forwarded: Arc::new(Mutex::new(None)),
            throttle: self.config.activity_throttle,
        };

        let task = tokio::spawn(self.run(rx, shutdown.clone()));
        tracing::info!(route = %route, "session watcher started");

        Ok(WatcherHandle {
            reporter,
            shutdown,
            task: Some(task),
        })
    }

    async fn run(
        self,
        mut activity: mpsc::UnboundedReceiver<ActivityEvent>,
        shutdown: Arc<Notify>,
    ) -> WatchExit {
        let idle = tokio::time::sleep(self.config.idle_timeout);
        tokio::pin!(idle);

        let mut poll = tokio::time::interval_at(
            Instant::now() + self.config.poll_interval,
            self.config.poll_interval,
        );
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut auth_state = self.lifecycle.subscribe();
        let mut in_flight: Option<CheckFuture> = None;

        let exit = loop {
            tokio::select! {
                _ = shutdown.notified() => break WatchExit::Stopped,

                changed = auth_state.changed() => {
                    if changed.is_err() || !auth_state.borrow_and_update().is_authenticated() {
                        tracing::debug!("session ended elsewhere");
                        break WatchExit::Stopped;
                    }
                }

                Some(event) = activity.recv() => {
                    tracing::trace!(?event, "activity; idle deadline reset");
                    idle.as_mut().reset(Instant::now() + self.config.idle_timeout);
                }

                _ = &mut idle => {
                    tracing::info!(timeout = ?self.config.idle_timeout, "idle timeout reached");
                    self.lifecycle.force_logout(LogoutReason::Idle);
                    break WatchExit::LoggedOut(LogoutReason::Idle);
                }

                _ = poll.tick() => {
                    if in_flight.is_some() {
                        tracing::debug!("previous session check still pending; skipping tick");
                        continue;
                    }
                    let session_id = self.lifecycle.store().session_id();
                    let checker = self.checker.clone();
                    in_flight = Some(Box::pin(async move {
                        checker.check(session_id.as_deref()).await
                    }));
                }

                result = pending_check(&mut in_flight) => {
                    in_flight = None;
                    match result {
                        Ok(SessionStatus::Active) => tracing::debug!("session still active"),
                        Ok(status) => {
                            tracing::info!(?status, "backend reports session no longer active");
                            self.lifecycle.force_logout(LogoutReason::SessionInactive);
                            break WatchExit::LoggedOut(LogoutReason::SessionInactive);
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "session check failed; keeping session");
                        }
                    }
                }
            }
        };

        // Dropping `in_flight` cancels a pending check; no state update after exit.
        drop(in_flight);
        tracing::info!(?exit, "session watcher stopped");
        exit
    }
}

type CheckFuture = Pin<Box<dyn Future<Output = Result<SessionStatus, SessionCheckError>> + Send>>;

/// Resolves with the pending check's result, or never if none is running.
async fn pending_check(
    in_flight: &mut Option<CheckFuture>,
) -> Result<SessionStatus, SessionCheckError> {
    match in_flight {
        Some(check) => check.await,
        None => std::future::pending().await,
    }
}

/// Handle to a running watcher. Dropping it aborts the task.
#[derive(Debug)]
pub struct WatcherHandle {
    reporter: ActivityReporter,
    shutdown: Arc<Notify>,
    task: Option<JoinHandle<WatchExit>>,
}

impl WatcherHandle {
    pub fn activity(&self) -> ActivityReporter {
        self.reporter.clone()
    }

    pub fn record(&self, event: ActivityEvent) -> bool {
        self.reporter.record(event)
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|t| t.is_finished())
    }

    /// Wait for the watcher to end on its own.
    pub async fn join(&mut self) -> WatchExit {
        let Some(task) = self.task.as_mut() else {
            return WatchExit::Stopped;
        };

        let exit = match task.await {
            Ok(exit) => exit,
            Err(e) => {
                tracing::warn!(error = %e, "session watcher task failed");
                WatchExit::Stopped
            }
        };
        self.task = None;
        exit
    }

    /// Stop the watcher and wait until its timers and channel are released.
    pub async fn stop(mut self) -> WatchExit {
        self.shutdown.notify_one();
        self.join().await
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use bizops_auth::{MemoryStorage, SessionStore, SessionUser};
    use bizops_core::UserId;

    use super::*;
    use crate::lifecycle::AuthState;

    /// Scripted session check; answers `Active` once the script runs out.
    #[derive(Default)]
    struct ScriptedCheck {
        script: Mutex<VecDeque<Result<SessionStatus, SessionCheckError>>>,
        repeat_network_error: bool,
        calls: AtomicUsize,
    }

    impl ScriptedCheck {
        fn answering(answers: Vec<Result<SessionStatus, SessionCheckError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(answers.into()),
                ..Default::default()
            })
        }

        fn quiet() -> Arc<Self> {
            Self::answering(vec![])
        }

        fn always_offline() -> Arc<Self> {
            Arc::new(Self {
                repeat_network_error: true,
                ..Default::default()
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SessionCheck for ScriptedCheck {
        async fn check(
            &self,
            _session_id: Option<&str>,
        ) -> Result<SessionStatus, SessionCheckError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.repeat_network_error {
                return Err(SessionCheckError::Network("unreachable".to_string()));
            }
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(SessionStatus::Active))
        }
    }

    /// Backend that accepts the request and never answers.
    #[derive(Default)]
    struct HangingCheck {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SessionCheck for HangingCheck {
        async fn check(
            &self,
            _session_id: Option<&str>,
        ) -> Result<SessionStatus, SessionCheckError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::future::pending().await
        }
    }

    fn config(idle_secs: u64, poll_secs: u64) -> LivenessConfig {
        LivenessConfig {
            idle_timeout: Duration::from_secs(idle_secs),
            poll_interval: Duration::from_secs(poll_secs),
            activity_throttle: Duration::from_secs(1),
        }
    }

    fn logged_in() -> Arc<SessionLifecycle<MemoryStorage>> {
        let lifecycle = SessionLifecycle::new(SessionStore::new(MemoryStorage::new()));
        lifecycle
            .login(&SessionUser::new(UserId::from(1), "trainer"), Some("sid-1"))
            .unwrap();
        Arc::new(lifecycle)
    }

    fn start<C: SessionCheck + 'static>(
        lifecycle: &Arc<SessionLifecycle<MemoryStorage>>,
        checker: Arc<C>,
        config: LivenessConfig,
        route: AppRoute,
    ) -> WatcherHandle {
        SessionWatcher::new(lifecycle.clone(), checker, config)
            .start(route)
            .unwrap()
    }

    async fn sleep_secs(secs: u64) {
        tokio::time::sleep(Duration::from_secs(secs)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn idle_timeout_logs_out() {
        let lifecycle = logged_in();
        let mut handle = start(
            &lifecycle,
            ScriptedCheck::quiet(),
            config(60, 3600),
            AppRoute::Timesheets,
        );

        sleep_secs(61).await;
        assert_eq!(handle.join().await, WatchExit::LoggedOut(LogoutReason::Idle));

        assert_eq!(lifecycle.store().load_user(), None);
        assert_eq!(lifecycle.store().session_id(), None);
        let state = lifecycle.state();
        let notice = state.notice().expect("logout notice");
        assert_eq!(notice.redirect, AppRoute::Login);
        assert!(notice.message.contains("inactivity"));
    }

    #[tokio::test(start_paused = true)]
    async fn activity_just_before_expiry_resets_idle_timer() {
        let lifecycle = logged_in();
        let mut handle = start(
            &lifecycle,
            ScriptedCheck::quiet(),
            config(60, 3600),
            AppRoute::Dashboard,
        );

        sleep_secs(59).await;
        assert!(handle.record(ActivityEvent::Key));

        sleep_secs(2).await;
        assert!(lifecycle.is_authenticated());
        assert!(!handle.is_finished());

        sleep_secs(60).await;
        assert_eq!(handle.join().await, WatchExit::LoggedOut(LogoutReason::Idle));
    }

    #[tokio::test(start_paused = true)]
    async fn activity_is_throttled() {
        let lifecycle = logged_in();
        let handle = start(
            &lifecycle,
            ScriptedCheck::quiet(),
            config(60, 3600),
            AppRoute::Dashboard,
        );
        let reporter = handle.activity();

        assert!(reporter.record(ActivityEvent::Pointer));
        assert!(!reporter.record(ActivityEvent::Pointer));
        assert!(!handle.record(ActivityEvent::Scroll));

        sleep_secs(1).await;
        assert!(reporter.record(ActivityEvent::Touch));
    }

    #[tokio::test(start_paused = true)]
    async fn inactive_backend_session_logs_out() {
        let lifecycle = logged_in();
        let checker = ScriptedCheck::answering(vec![Ok(SessionStatus::Inactive)]);
        let mut handle = start(&lifecycle, checker.clone(), config(3600, 10), AppRoute::Timesheets);

        sleep_secs(11).await;
        assert_eq!(
            handle.join().await,
            WatchExit::LoggedOut(LogoutReason::SessionInactive)
        );
        assert_eq!(checker.calls(), 1);
        assert!(!lifecycle.store().is_authenticated());
        assert_eq!(
            lifecycle.state().notice().map(|n| n.message.as_str()),
            Some("Your session has expired. Please log in again.")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_status_logs_out() {
        let lifecycle = logged_in();
        let checker = ScriptedCheck::answering(vec![
            Ok(SessionStatus::Active),
            Ok(SessionStatus::Rejected(401)),
        ]);
        let mut handle = start(&lifecycle, checker.clone(), config(3600, 10), AppRoute::Timesheets);

        sleep_secs(21).await;
        assert_eq!(
            handle.join().await,
            WatchExit::LoggedOut(LogoutReason::SessionInactive)
        );
        assert_eq!(checker.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn network_errors_keep_session() {
        let lifecycle = logged_in();
        let checker = ScriptedCheck::always_offline();
        let handle = start(&lifecycle, checker.clone(), config(3600, 10), AppRoute::Timesheets);

        sleep_secs(35).await;
        assert_eq!(checker.calls(), 3);
        assert!(lifecycle.is_authenticated());
        assert!(lifecycle.store().load_user().is_some());

        assert_eq!(handle.stop().await, WatchExit::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_session_check_does_not_block_idle_timeout() {
        let lifecycle = logged_in();
        let checker = Arc::new(HangingCheck::default());
        let mut handle = start(&lifecycle, checker.clone(), config(60, 10), AppRoute::Dashboard);

        sleep_secs(600).await;
        assert!(handle.is_finished());
        assert_eq!(handle.join().await, WatchExit::LoggedOut(LogoutReason::Idle));
        assert!(!lifecycle.is_authenticated());
        // Later ticks wait for the pending check instead of stacking new ones.
        assert_eq!(checker.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn activity_and_stop_work_while_check_is_pending() {
        let lifecycle = logged_in();
        let checker = Arc::new(HangingCheck::default());
        let handle = start(&lifecycle, checker.clone(), config(60, 10), AppRoute::Dashboard);

        sleep_secs(50).await;
        assert!(handle.record(ActivityEvent::Pointer));
        sleep_secs(50).await;
        assert!(lifecycle.is_authenticated());
        assert_eq!(checker.calls.load(Ordering::SeqCst), 1);

        assert_eq!(handle.stop().await, WatchExit::Stopped);
        assert!(lifecycle.is_authenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_releases_activity_channel() {
        let lifecycle = logged_in();
        let handle = start(
            &lifecycle,
            ScriptedCheck::quiet(),
            config(60, 3600),
            AppRoute::Dashboard,
        );
        let reporter = handle.activity();

        assert_eq!(handle.stop().await, WatchExit::Stopped);
        sleep_secs(5).await;
        assert!(!reporter.record(ActivityEvent::Key));

        // The idle timer went with the task.
        sleep_secs(120).await;
        assert!(lifecycle.is_authenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn manual_logout_stops_watcher() {
        let lifecycle = logged_in();
        let mut handle = start(
            &lifecycle,
            ScriptedCheck::quiet(),
            config(60, 3600),
            AppRoute::Dashboard,
        );

        assert!(lifecycle.logout());
        assert_eq!(handle.join().await, WatchExit::Stopped);
        assert!(matches!(
            lifecycle.state(),
            AuthState::LoggedOut(Some(ref n)) if n.reason == LogoutReason::Manual
        ));
    }

    #[tokio::test]
    async fn refuses_to_start_without_session_or_on_login_page() {
        let anonymous = Arc::new(SessionLifecycle::new(SessionStore::new(MemoryStorage::new())));
        let err = SessionWatcher::new(anonymous, ScriptedCheck::quiet(), LivenessConfig::default())
            .start(AppRoute::Dashboard)
            .unwrap_err();
        assert_eq!(err, WatchError::NotAuthenticated);

        let defaults = LivenessConfig::default();
        let err = SessionWatcher::new(logged_in(), ScriptedCheck::quiet(), defaults)
            .start(AppRoute::Login)
            .unwrap_err();
        assert_eq!(err, WatchError::AuthPage(AppRoute::Login));
    }

    #[test]
    fn dom_events_map_to_activity_kinds() {
        assert_eq!(ActivityEvent::from_dom_event("mousemove"), Some(ActivityEvent::Pointer));
        assert_eq!(ActivityEvent::from_dom_event("keydown"), Some(ActivityEvent::Key));
        assert_eq!(ActivityEvent::from_dom_event("touchstart"), Some(ActivityEvent::Touch));
        assert_eq!(ActivityEvent::from_dom_event("resize"), None);
    }
}
