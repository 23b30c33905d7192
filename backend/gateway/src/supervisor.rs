//! Connection Supervisor
//!
//! Owns the platform connection for the lifetime of the process: opens it,
//! keeps it alive with a periodic probe, and rebuilds it when it drops.
//! Every failure path (transport disconnect, client error, failed probe)
//! funnels into a single recovery routine, and at most one recovery run is
//! in flight at a time.
//!
//! Each connection handle gets its own event channel and pump task. When a
//! handle is replaced the generation counter moves on and the old pump stops,
//! so events from a dead session never touch the state machine. A new pump
//! only starts once the caller has settled the state for the new session.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use async_trait::async_trait;
use chrono::Utc;
use devhelper_commands::CommandDispatcher;
use devhelper_core::{
    BotControl, BotError, BotState, BotStatus, ButtonClick, ChannelRef, ConnectionHandle,
    ConnectionStateMachine, ConnectivitySummary, InboundMessage, PlatformClient, PlatformEvent,
    ReplyPayload, ReplySink, DEFAULT_COMMAND_PREFIX,
};
use tokio::sync::{mpsc, watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::backoff::{ReconnectPolicy, RecoveryTrigger};
use crate::gate::{evaluate, GateDecision};

const EVENT_BUFFER: usize = 256;

/// A logged-in session whose events are buffered until its pump starts.
struct FreshSession {
    generation: u64,
    events: mpsc::Receiver<PlatformEvent>,
}

#[derive(Default)]
struct Timers {
    probe: Option<JoinHandle<()>>,
    recovery: Option<JoinHandle<()>>,
}

pub struct ConnectionSupervisor {
    me: Weak<ConnectionSupervisor>,
    client: Arc<dyn PlatformClient>,
    state: Arc<ConnectionStateMachine>,
    policy: ReconnectPolicy,
    handle: RwLock<Option<Arc<dyn ConnectionHandle>>>,
    dispatcher: RwLock<Option<Arc<CommandDispatcher>>>,
    /// Serializes handle replacement.
    connect_lock: tokio::sync::Mutex<()>,
    generation: watch::Sender<u64>,
    attempts: AtomicU32,
    recovering: AtomicBool,
    timers: Mutex<Timers>,
}

impl ConnectionSupervisor {
    pub fn new(
        client: Arc<dyn PlatformClient>,
        state: Arc<ConnectionStateMachine>,
        policy: ReconnectPolicy,
    ) -> Arc<Self> {
        let (generation, _) = watch::channel(0);
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            client,
            state,
            policy,
            handle: RwLock::new(None),
            dispatcher: RwLock::new(None),
            connect_lock: tokio::sync::Mutex::new(()),
            generation,
            attempts: AtomicU32::new(0),
            recovering: AtomicBool::new(false),
            timers: Mutex::new(Timers::default()),
        })
    }

    pub fn state_machine(&self) -> &Arc<ConnectionStateMachine> {
        &self.state
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn is_probe_running(&self) -> bool {
        self.timers().probe.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub fn is_recovering(&self) -> bool {
        self.recovering.load(Ordering::SeqCst)
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Open the initial connection, go Active and start the probe.
    ///
    /// A failed login leaves the bot in Error with a recovery run scheduled,
    /// so the process keeps trying without operator action.
    pub async fn start(&self, dispatcher: Arc<CommandDispatcher>) -> Result<(), BotError> {
        *self.dispatcher.write().await = Some(dispatcher);
        info!(platform = self.client.name(), "[Supervisor] Starting");

        let session = match self.connect().await {
            Ok(session) => session,
            Err(e) => {
                error!(error = %e, "[Supervisor] Initial login failed");
                self.state.set_error(format!("Startup failed: {e}"));
                self.start_probe();
                self.trigger_recovery(RecoveryTrigger::ClientError);
                return Err(e);
            }
        };

        self.mark_active();
        self.start_probe();
        self.spawn_pump(session);
        Ok(())
    }

    /// Stop every timer, stop the pump and tear the session down.
    pub async fn shutdown(&self) {
        info!("[Supervisor] Shutting down");
        self.cancel_timers();
        let _guard = self.connect_lock.lock().await;
        self.generation.send_modify(|g| *g += 1);
        let old = self.handle.write().await.take();
        if let Some(old) = old {
            old.shutdown().await;
        }
        *self.dispatcher.write().await = None;
    }

    /// Replace the current handle with a freshly logged-in one. The caller
    /// starts its pump with `spawn_pump`.
    async fn connect(&self) -> Result<FreshSession, BotError> {
        let _guard = self.connect_lock.lock().await;

        let generation = {
            self.generation.send_modify(|g| *g += 1);
            *self.generation.borrow()
        };

        let previous = self.handle.write().await.take();
        if let Some(old) = previous {
            debug!(generation, "[Supervisor] Shutting down previous session");
            old.shutdown().await;
        }

        let (tx, events) = mpsc::channel(EVENT_BUFFER);
        let handle = self.client.login(tx).await?;
        *self.handle.write().await = Some(handle);

        info!(generation, platform = self.client.name(), "[Supervisor] Session established");
        Ok(FreshSession { generation, events })
    }

    fn mark_active(&self) {
        self.attempts.store(0, Ordering::SeqCst);
        self.state.set_active();
    }

    async fn current_handle(&self) -> Option<Arc<dyn ConnectionHandle>> {
        self.handle.read().await.clone()
    }

    // -----------------------------------------------------------------------
    // Timers
    // -----------------------------------------------------------------------

    fn timers(&self) -> std::sync::MutexGuard<'_, Timers> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn start_probe(&self) {
        let weak = self.me.clone();
        let period = self.policy.probe_interval();

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(this) = weak.upgrade() else { break };
                this.run_probe().await;
            }
        });

        if let Some(previous) = self.timers().probe.replace(task) {
            previous.abort();
        }
        debug!(interval_secs = period.as_secs(), "[Supervisor] Probe started");
    }

    fn stop_probe(&self) {
        if let Some(task) = self.timers().probe.take() {
            task.abort();
            debug!("[Supervisor] Probe stopped");
        }
    }

    fn cancel_recovery(&self) {
        if let Some(task) = self.timers().recovery.take() {
            task.abort();
            debug!("[Supervisor] Pending recovery cancelled");
        }
        self.recovering.store(false, Ordering::SeqCst);
    }

    fn cancel_timers(&self) {
        self.stop_probe();
        self.cancel_recovery();
    }

    async fn run_probe(&self) {
        if self.check_connection().await {
            debug!("[Supervisor] Probe ok");
            return;
        }
        warn!("[Supervisor] Connection check failed");
        self.begin_recovery(RecoveryTrigger::ProbeFailure, None);
    }

    // -----------------------------------------------------------------------
    // Recovery
    // -----------------------------------------------------------------------

    fn retries_exhausted(&self) -> bool {
        !self.policy.should_retry(self.attempts())
    }

    fn exhausted_reason(&self) -> String {
        format!("Maximum reconnection attempts ({}) reached", self.policy.max_attempts)
    }

    /// Record the failure in the state machine and kick off recovery unless
    /// the bot was deactivated on purpose or has run out of attempts.
    fn begin_recovery(&self, trigger: RecoveryTrigger, detail: Option<String>) {
        match self.state.state() {
            BotState::Inactive => {
                debug!(%trigger, "[Supervisor] Bot is deactivated, not recovering");
                return;
            }
            BotState::Error if self.retries_exhausted() => {
                warn!(%trigger, "[Supervisor] Reconnect attempts exhausted, waiting for manual reset");
                return;
            }
            _ => {}
        }

        match (trigger, detail) {
            (RecoveryTrigger::ClientError, Some(detail)) => self.state.set_error(detail),
            (RecoveryTrigger::ClientError, None) => self.state.set_error("Client error"),
            _ => self.state.set_reconnecting(),
        }

        self.trigger_recovery(trigger);
    }

    fn trigger_recovery(&self, trigger: RecoveryTrigger) {
        if self.recovering.swap(true, Ordering::SeqCst) {
            debug!(%trigger, "[Supervisor] Recovery already in flight");
            return;
        }
        let Some(this) = self.me.upgrade() else {
            self.recovering.store(false, Ordering::SeqCst);
            return;
        };

        info!(%trigger, "[Supervisor] Scheduling recovery");
        let task = tokio::spawn(async move { this.run_recovery(trigger).await });

        if let Some(stale) = self.timers().recovery.replace(task) {
            stale.abort();
        }
    }

    /// Clears the in-flight flag itself on every exit, before any event from
    /// a new session can be handled.
    async fn run_recovery(&self, trigger: RecoveryTrigger) {
        let mut delay = self.policy.initial_delay(trigger);

        loop {
            sleep(delay).await;

            if self.retries_exhausted() {
                error!(
                    max_attempts = self.policy.max_attempts,
                    "[Supervisor] Giving up on reconnecting"
                );
                self.state.set_error(self.exhausted_reason());
                self.recovering.store(false, Ordering::SeqCst);
                return;
            }

            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            info!(
                attempt,
                max_attempts = self.policy.max_attempts,
                %trigger,
                "[Supervisor] Reconnect attempt"
            );

            match self.connect().await {
                Ok(session) => {
                    info!(attempt, "[Supervisor] Reconnected");
                    self.mark_active();
                    self.recovering.store(false, Ordering::SeqCst);
                    self.spawn_pump(session);
                    return;
                }
                Err(e) => {
                    delay = self.policy.delay_for(attempt);
                    warn!(
                        attempt,
                        error = %e,
                        retry_in_ms = delay.as_millis() as u64,
                        "[Supervisor] Reconnect failed"
                    );
                    self.state.set_error(format!("Reconnection failed: {e}"));
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Event pump
    // -----------------------------------------------------------------------

    fn spawn_pump(&self, session: FreshSession) {
        let FreshSession { generation, mut events } = session;
        let weak = self.me.clone();
        let mut current = self.generation.subscribe();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    changed = current.changed() => {
                        if changed.is_err() || *current.borrow() != generation {
                            break;
                        }
                    }
                    event = events.recv() => {
                        let Some(event) = event else { break };
                        if *current.borrow() != generation {
                            debug!(generation, kind = event.kind(), "[Supervisor] Dropping event from replaced session");
                            break;
                        }
                        let Some(this) = weak.upgrade() else { break };
                        this.handle_event(event).await;
                    }
                }
            }
            debug!(generation, "[Supervisor] Event pump stopped");
        });
    }

    async fn handle_event(&self, event: PlatformEvent) {
        match event {
            PlatformEvent::Connected => {
                if self.state.state() == BotState::Inactive {
                    debug!("[Supervisor] Session ready while deactivated");
                    return;
                }
                info!("[Supervisor] Platform connected");
                self.mark_active();
            }
            PlatformEvent::Disconnected => {
                warn!("[Supervisor] Platform disconnected");
                self.begin_recovery(RecoveryTrigger::Disconnect, None);
            }
            PlatformEvent::Error(detail) => {
                error!(error = %detail, "[Supervisor] Platform client error");
                self.begin_recovery(RecoveryTrigger::ClientError, Some(format!("Client error: {detail}")));
            }
            PlatformEvent::Message(message) => self.route_message(message).await,
            PlatformEvent::ButtonClick(click) => self.route_click(click).await,
        }
    }

    async fn route_message(&self, message: InboundMessage) {
        let decision = evaluate(&message, self.state.is_active());
        debug!(
            channel_id = %message.channel_id,
            message_id = %message.message_id,
            ?decision,
            "[Gate] Message"
        );

        if decision == GateDecision::Activate {
            let confirmation = if self.activate_bot().await {
                ReplyPayload::text("✅ Bot activated and ready for commands!")
            } else {
                ReplyPayload::text(format!("❌ Activation failed: {}", self.state.reason()))
            };
            self.deliver(&message.channel(), confirmation).await;
        }

        if !decision.dispatches() {
            return;
        }

        let Some(dispatcher) = self.dispatcher.read().await.clone() else {
            return;
        };
        if let Some(reply) = dispatcher.dispatch(&message.text, &message).await {
            self.deliver(&message.channel(), reply).await;
        }
    }

    async fn route_click(&self, click: ButtonClick) {
        if !self.state.is_active() {
            debug!(custom_id = %click.custom_id, "[Gate] Click ignored while inactive");
            return;
        }
        let Some(dispatcher) = self.dispatcher.read().await.clone() else {
            return;
        };
        if let Some(reply) = dispatcher.dispatch_click(&click).await {
            self.deliver(&click.channel(), reply).await;
        }
    }

    /// Best-effort reply; a failed delivery is logged and dropped.
    async fn deliver(&self, channel: &ChannelRef, payload: ReplyPayload) {
        if let Err(e) = self.send_reply(channel, payload).await {
            warn!(channel_id = %channel.channel_id, error = %e, "[Supervisor] Reply not delivered");
        }
    }
}

#[async_trait]
impl BotControl for ConnectionSupervisor {
    /// Idempotent: an active bot is left untouched. Otherwise the current
    /// session is verified (or rebuilt) before going Active, and the attempt
    /// counter is reset.
    async fn activate_bot(&self) -> bool {
        if self.state.is_active() {
            debug!("[Supervisor] Already active");
            return true;
        }

        info!("[Supervisor] Activating");
        self.cancel_recovery();

        if !self.check_connection().await {
            info!("[Supervisor] No healthy session, logging in again before activation");
            match self.connect().await {
                Ok(session) => {
                    self.mark_active();
                    self.start_probe();
                    self.spawn_pump(session);
                    return true;
                }
                Err(e) => {
                    error!(error = %e, "[Supervisor] Activation failed");
                    self.state.set_error(format!("Activation failed: {e}"));
                    return false;
                }
            }
        }

        self.mark_active();
        self.start_probe();
        true
    }

    async fn deactivate_bot(&self, reason: &str) -> bool {
        info!(reason, "[Supervisor] Deactivating");
        self.state.set_inactive(reason);
        self.cancel_timers();
        true
    }

    /// Tear down and rebuild the session from scratch with a fresh attempt
    /// budget. A failed login leaves the bot in Error without retrying.
    async fn reset_bot(&self) -> bool {
        info!("[Supervisor] Manual reset requested");
        self.cancel_timers();
        self.attempts.store(0, Ordering::SeqCst);
        self.state.set_reconnecting();

        match self.connect().await {
            Ok(session) => {
                self.mark_active();
                self.start_probe();
                self.spawn_pump(session);
                info!("[Supervisor] Reset complete");
                true
            }
            Err(e) => {
                error!(error = %e, "[Supervisor] Reset failed");
                self.state.set_error(format!("Manual reset failed: {e}"));
                false
            }
        }
    }

    async fn status(&self) -> BotStatus {
        let snapshot = self.state.snapshot();
        let connectivity = match self.current_handle().await {
            Some(handle) => handle.connectivity(),
            None => ConnectivitySummary::default(),
        };

        BotStatus {
            state: snapshot.state,
            since: snapshot.since,
            reason: snapshot.reason,
            attempts: self.attempts(),
            max_attempts: self.policy.max_attempts,
            connectivity,
            command_prefix: DEFAULT_COMMAND_PREFIX.to_string(),
            timestamp: Utc::now(),
        }
    }

    async fn check_connection(&self) -> bool {
        let Some(handle) = self.current_handle().await else {
            return false;
        };
        match handle.probe().await {
            Ok(healthy) => healthy,
            Err(e) => {
                warn!(error = %e, "[Supervisor] Probe error");
                false
            }
        }
    }

    fn is_active(&self) -> bool {
        self.state.is_active()
    }
}

#[async_trait]
impl ReplySink for ConnectionSupervisor {
    async fn send_reply(&self, channel: &ChannelRef, payload: ReplyPayload) -> Result<(), BotError> {
        match self.current_handle().await {
            Some(handle) => handle.send_reply(channel, payload).await,
            None => Err(BotError::NotConnected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use devhelper_commands::{build_default_dispatcher, CommandDef, CommandHandler};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    // -- fakes --------------------------------------------------------------

    struct FakeHandle {
        healthy: AtomicBool,
        closed: AtomicBool,
        sent: Arc<Mutex<Vec<(ChannelRef, ReplyPayload)>>>,
    }

    #[async_trait]
    impl ConnectionHandle for FakeHandle {
        async fn probe(&self) -> Result<bool, BotError> {
            Ok(self.healthy.load(Ordering::SeqCst) && !self.closed.load(Ordering::SeqCst))
        }

        async fn shutdown(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }

        async fn send_reply(&self, channel: &ChannelRef, payload: ReplyPayload) -> Result<(), BotError> {
            self.sent.lock().unwrap().push((channel.clone(), payload));
            Ok(())
        }

        fn connectivity(&self) -> ConnectivitySummary {
            ConnectivitySummary {
                has_user: true,
                user_id: Some("42".into()),
                user_name: Some("devhelper".into()),
                server_count: 1,
            }
        }
    }

    #[derive(Default)]
    struct FakePlatform {
        login_calls: AtomicUsize,
        failing: AtomicBool,
        drop_on_login: AtomicBool,
        senders: Mutex<Vec<mpsc::Sender<PlatformEvent>>>,
        handles: Mutex<Vec<Arc<FakeHandle>>>,
        sent: Arc<Mutex<Vec<(ChannelRef, ReplyPayload)>>>,
    }

    impl FakePlatform {
        fn logins(&self) -> usize {
            self.login_calls.load(Ordering::SeqCst)
        }

        fn fail_logins(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        fn drop_sessions_on_login(&self, dropping: bool) {
            self.drop_on_login.store(dropping, Ordering::SeqCst);
        }

        fn sender(&self, index: usize) -> mpsc::Sender<PlatformEvent> {
            self.senders.lock().unwrap()[index].clone()
        }

        async fn emit(&self, event: PlatformEvent) {
            let tx = self.senders.lock().unwrap().last().cloned().unwrap();
            tx.send(event).await.unwrap();
        }

        fn latest_handle(&self) -> Arc<FakeHandle> {
            self.handles.lock().unwrap().last().cloned().unwrap()
        }

        fn replies(&self) -> Vec<String> {
            self.sent.lock().unwrap().iter().map(|(_, p)| p.text.clone()).collect()
        }
    }

    #[async_trait]
    impl PlatformClient for FakePlatform {
        fn name(&self) -> &str {
            "fake"
        }

        async fn login(
            &self,
            events: mpsc::Sender<PlatformEvent>,
        ) -> Result<Arc<dyn ConnectionHandle>, BotError> {
            self.login_calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(BotError::Login("invalid token".into()));
            }
            let handle = Arc::new(FakeHandle {
                healthy: AtomicBool::new(true),
                closed: AtomicBool::new(false),
                sent: self.sent.clone(),
            });
            if self.drop_on_login.load(Ordering::SeqCst) {
                events.try_send(PlatformEvent::Disconnected).unwrap();
            }
            self.senders.lock().unwrap().push(events);
            self.handles.lock().unwrap().push(handle.clone());
            Ok(handle)
        }
    }

    struct Recorder {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CommandHandler for Recorder {
        async fn execute(&self, _args: &[String], _msg: &InboundMessage) -> Result<Option<ReplyPayload>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(ReplyPayload::text("kb result")))
        }
    }

    // -- helpers ------------------------------------------------------------

    async fn settle(secs: u64) {
        sleep(Duration::from_secs(secs)).await;
    }

    fn supervisor_with(policy: ReconnectPolicy) -> (Arc<FakePlatform>, Arc<ConnectionSupervisor>) {
        let platform = Arc::new(FakePlatform::default());
        let state = Arc::new(ConnectionStateMachine::new());
        let sup = ConnectionSupervisor::new(platform.clone(), state, policy);
        (platform, sup)
    }

    async fn started() -> (Arc<FakePlatform>, Arc<ConnectionSupervisor>, Arc<AtomicUsize>) {
        let (platform, sup) = supervisor_with(ReconnectPolicy::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let mut dispatcher = build_default_dispatcher(sup.clone());
        dispatcher.register(CommandDef::named("kb"), Arc::new(Recorder { calls: calls.clone() }));
        sup.start(Arc::new(dispatcher)).await.unwrap();
        (platform, sup, calls)
    }

    fn chat(text: &str) -> PlatformEvent {
        PlatformEvent::Message(InboundMessage::new("c1", text))
    }

    fn click(custom_id: &str) -> PlatformEvent {
        PlatformEvent::ButtonClick(ButtonClick {
            server_id: "s1".into(),
            channel_id: "c1".into(),
            message_id: "m1".into(),
            sender_id: "u1".into(),
            custom_id: custom_id.into(),
        })
    }

    // -- lifecycle ----------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn start_goes_active_with_probe() {
        let (platform, sup, _) = started().await;
        assert_eq!(sup.state_machine().state(), BotState::Active);
        assert_eq!(platform.logins(), 1);
        assert!(sup.is_probe_running());
        assert_eq!(sup.attempts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_start_lands_in_error_and_keeps_trying() {
        let (platform, sup) = supervisor_with(ReconnectPolicy::default());
        platform.fail_logins(true);
        let dispatcher = Arc::new(build_default_dispatcher(sup.clone()));
        assert!(sup.start(dispatcher).await.is_err());
        assert_eq!(sup.state_machine().state(), BotState::Error);
        assert!(sup.state_machine().reason().starts_with("Startup failed"));

        platform.fail_logins(false);
        settle(10).await;
        assert_eq!(sup.state_machine().state(), BotState::Active);
        assert_eq!(sup.attempts(), 0);
    }

    // -- recovery -----------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn disconnect_recovers_and_resets_counter() {
        let (platform, sup, _) = started().await;
        platform.fail_logins(true);
        platform.emit(PlatformEvent::Disconnected).await;
        settle(1).await;
        assert_eq!(sup.state_machine().state(), BotState::Reconnecting);

        // First attempt at 3s fails, second follows 6s later.
        settle(3).await;
        assert_eq!(sup.attempts(), 1);
        assert_eq!(sup.state_machine().state(), BotState::Error);

        platform.fail_logins(false);
        settle(7).await;
        assert_eq!(sup.state_machine().state(), BotState::Active);
        assert_eq!(sup.attempts(), 0);
        assert_eq!(platform.logins(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_disconnects_exhaust_attempts_then_stop() {
        let (platform, sup, _) = started().await;
        platform.fail_logins(true);
        for _ in 0..5 {
            platform.emit(PlatformEvent::Disconnected).await;
            settle(1).await;
        }
        settle(200).await;

        assert_eq!(sup.state_machine().state(), BotState::Error);
        assert_eq!(sup.attempts(), 5);
        assert_eq!(sup.state_machine().reason(), "Maximum reconnection attempts (5) reached");
        let logins = platform.logins();
        assert_eq!(logins, 6);

        let mut changes = sup.state_machine().subscribe();
        platform.emit(PlatformEvent::Disconnected).await;
        settle(200).await;
        assert_eq!(platform.logins(), logins);
        assert_eq!(sup.state_machine().state(), BotState::Error);
        assert!(changes.try_recv().is_err(), "state left Error after exhaustion");
    }

    #[tokio::test(start_paused = true)]
    async fn client_error_waits_longer_before_retrying() {
        let (platform, sup, _) = started().await;
        platform.emit(PlatformEvent::Error("gateway closed 4000".into())).await;
        settle(1).await;
        assert_eq!(sup.state_machine().state(), BotState::Error);
        assert_eq!(sup.state_machine().reason(), "Client error: gateway closed 4000");

        settle(3).await;
        assert_eq!(platform.logins(), 1);
        settle(2).await;
        assert_eq!(platform.logins(), 2);
        assert_eq!(sup.state_machine().state(), BotState::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_probe_triggers_recovery() {
        let (platform, sup) = supervisor_with(ReconnectPolicy {
            probe_interval_secs: 60,
            ..Default::default()
        });
        sup.start(Arc::new(CommandDispatcher::new())).await.unwrap();
        platform.latest_handle().healthy.store(false, Ordering::SeqCst);

        settle(61).await;
        assert_eq!(sup.state_machine().state(), BotState::Reconnecting);
        settle(3).await;
        assert_eq!(sup.state_machine().state(), BotState::Active);
        assert_eq!(platform.logins(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_triggers_share_one_recovery() {
        let (platform, sup) = supervisor_with(ReconnectPolicy {
            probe_interval_secs: 10,
            ..Default::default()
        });
        sup.start(Arc::new(CommandDispatcher::new())).await.unwrap();
        platform.latest_handle().healthy.store(false, Ordering::SeqCst);

        settle(9).await;
        platform.emit(PlatformEvent::Disconnected).await;
        // Probe fires at 10s while the disconnect recovery is still waiting.
        settle(2).await;
        assert!(sup.is_recovering());
        assert_eq!(platform.logins(), 1);

        settle(2).await;
        assert_eq!(platform.logins(), 2);
        assert_eq!(sup.state_machine().state(), BotState::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn events_from_replaced_session_are_ignored() {
        let (platform, sup, _) = started().await;
        assert!(sup.reset_bot().await);
        assert_eq!(platform.logins(), 2);
        assert!(platform.handles.lock().unwrap()[0].closed.load(Ordering::SeqCst));

        let stale = platform.sender(0);
        let _ = stale.send(PlatformEvent::Disconnected).await;
        settle(10).await;
        assert_eq!(sup.state_machine().state(), BotState::Active);
        assert_eq!(platform.logins(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_right_after_reconnect_starts_another_recovery() {
        let (platform, sup, _) = started().await;
        platform.drop_sessions_on_login(true);
        platform.emit(PlatformEvent::Disconnected).await;
        settle(4).await;
        assert_eq!(platform.logins(), 2);
        assert_eq!(sup.state_machine().state(), BotState::Reconnecting);
        assert!(sup.is_recovering());

        platform.drop_sessions_on_login(false);
        settle(4).await;
        assert_eq!(platform.logins(), 3);
        assert_eq!(sup.state_machine().state(), BotState::Active);
        assert!(!sup.is_recovering());
    }

    // -- control ------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn activate_is_idempotent_when_active() {
        let (platform, sup, _) = started().await;
        let mut changes = sup.state_machine().subscribe();
        assert!(sup.activate_bot().await);
        assert_eq!(platform.logins(), 1);
        assert!(changes.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn deactivate_gates_commands_until_activate() {
        let (platform, sup, calls) = started().await;

        platform.emit(chat("*deactivate maintenance")).await;
        settle(1).await;
        assert_eq!(sup.state_machine().state(), BotState::Inactive);
        assert_eq!(sup.state_machine().reason(), "maintenance");
        assert!(!sup.is_probe_running());

        platform.emit(chat("*kb search")).await;
        settle(1).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        platform.emit(chat("*activate")).await;
        settle(1).await;
        assert_eq!(sup.state_machine().state(), BotState::Active);
        assert!(sup.is_probe_running());
        assert!(platform.replies().iter().any(|r| r.contains("activated and ready")));

        platform.emit(chat("*kb search")).await;
        settle(1).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        // Healthy session was reused.
        assert_eq!(platform.logins(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn botstatus_answers_while_inactive() {
        let (platform, sup, _) = started().await;
        sup.deactivate_bot("night").await;
        platform.emit(chat("*botstatus")).await;
        settle(1).await;
        let replies = platform.replies();
        assert_eq!(replies.len(), 1);
        assert!(replies[0].contains("inactive"), "unexpected reply: {}", replies[0]);
    }

    #[tokio::test(start_paused = true)]
    async fn unprefixed_admin_words_are_plain_chat() {
        let (platform, sup, _) = started().await;
        platform.emit(chat("deactivate lunch")).await;
        platform.emit(chat("botstatus")).await;
        settle(1).await;
        assert_eq!(sup.state_machine().state(), BotState::Active);
        assert!(platform.replies().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn activation_sends_a_single_confirmation() {
        let (platform, sup, _) = started().await;
        sup.deactivate_bot("night").await;

        platform.emit(chat("*active")).await;
        settle(1).await;
        assert_eq!(sup.state_machine().state(), BotState::Inactive);
        assert!(platform.replies().is_empty());

        platform.emit(chat("activate")).await;
        settle(1).await;
        assert_eq!(sup.state_machine().state(), BotState::Active);
        assert_eq!(platform.replies(), vec!["✅ Bot activated and ready for commands!".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn button_clicks_only_answer_while_active() {
        let (platform, sup, _) = started().await;
        sup.deactivate_bot("night").await;
        platform.emit(click("help:bug")).await;
        settle(1).await;
        assert!(platform.sent.lock().unwrap().is_empty());

        assert!(sup.activate_bot().await);
        platform.emit(click("help:bug")).await;
        settle(1).await;
        let sent = platform.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0.channel_id, "c1");
        assert_eq!(sent[0].1.embeds[0].title, "🐛 Bug guide");
    }

    #[tokio::test(start_paused = true)]
    async fn edited_messages_never_dispatch() {
        let (platform, _sup, calls) = started().await;
        let mut edited = InboundMessage::new("c1", "*kb search");
        edited.is_edited = true;
        platform.emit(PlatformEvent::Message(edited)).await;
        settle(1).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(platform.replies().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn deactivate_cancels_pending_recovery() {
        let (platform, sup, _) = started().await;
        platform.emit(PlatformEvent::Disconnected).await;
        settle(1).await;
        sup.deactivate_bot("paused").await;
        assert!(!sup.is_recovering());

        settle(60).await;
        assert_eq!(platform.logins(), 1);
        assert_eq!(sup.state_machine().state(), BotState::Inactive);

        // Transport noise while deactivated changes nothing.
        platform.emit(PlatformEvent::Connected).await;
        platform.emit(PlatformEvent::Disconnected).await;
        settle(60).await;
        assert_eq!(sup.state_machine().state(), BotState::Inactive);
        assert_eq!(platform.logins(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn activate_rebuilds_dead_session() {
        let (platform, sup, _) = started().await;
        sup.deactivate_bot("x").await;
        platform.latest_handle().healthy.store(false, Ordering::SeqCst);
        assert!(sup.activate_bot().await);
        assert_eq!(platform.logins(), 2);
        assert_eq!(sup.attempts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_restores_after_exhaustion() {
        let (platform, sup, _) = started().await;
        platform.fail_logins(true);
        platform.emit(PlatformEvent::Disconnected).await;
        settle(200).await;
        assert_eq!(sup.attempts(), 5);

        platform.fail_logins(false);
        assert!(sup.reset_bot().await);
        assert_eq!(sup.state_machine().state(), BotState::Active);
        assert_eq!(sup.attempts(), 0);
        assert!(sup.is_probe_running());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_reset_does_not_retry() {
        let (platform, sup, _) = started().await;
        platform.fail_logins(true);
        assert!(!sup.reset_bot().await);
        assert_eq!(sup.state_machine().state(), BotState::Error);
        assert!(sup.state_machine().reason().starts_with("Manual reset failed"));

        let logins = platform.logins();
        settle(600).await;
        assert_eq!(platform.logins(), logins);
    }

    #[tokio::test(start_paused = true)]
    async fn status_reports_connectivity_and_attempts() {
        let (_platform, sup, _) = started().await;
        let status = sup.status().await;
        assert_eq!(status.state, BotState::Active);
        assert_eq!(status.max_attempts, 5);
        assert_eq!(status.command_prefix, "*");
        assert_eq!(status.connectivity.user_name.as_deref(), Some("devhelper"));
    }

    #[tokio::test(start_paused = true)]
    async fn send_reply_without_session_fails() {
        let (_platform, sup) = supervisor_with(ReconnectPolicy::default());
        let err = sup
            .send_reply(
                &ChannelRef { server_id: "s1".into(), channel_id: "c1".into() },
                ReplyPayload::text("hi"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BotError::NotConnected));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_everything() {
        let (platform, sup, _) = started().await;
        sup.shutdown().await;
        assert!(!sup.is_probe_running());
        assert!(platform.latest_handle().closed.load(Ordering::SeqCst));
        assert!(!sup.check_connection().await);
    }
}
