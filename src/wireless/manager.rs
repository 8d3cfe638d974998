use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::coprocessor::CoprocessorMonitor;
use crate::error::{WirelessError, WirelessResult};
use crate::settings::PlatformSettings;

use super::cancel::{CancelSource, CancelToken};
use super::events::{ConnectionDetail, DisconnectReason, WirelessEvent, EVENT_CHANNEL_CAPACITY};
use super::radio::{LinkNotification, RadioLink};
use super::types::{
    AdapterState, AntennaType, ConnectionConfig, Disconnection, LinkParameters,
    NetworkDescriptor, ReconnectionPolicy,
};

/// First wait before an automatic re-join attempt; doubles per attempt.
const RECONNECT_BACKOFF_BASE: Duration = Duration::from_secs(1);
/// Ceiling for the doubling back-off.
const RECONNECT_BACKOFF_CAP: Duration = Duration::from_secs(30);

/// The association currently held by the adapter
struct ActiveLink {
    config: ConnectionConfig,
    params: LinkParameters,
}

struct Inner {
    radio: Arc<dyn RadioLink>,
    coprocessor: Option<Arc<dyn CoprocessorMonitor>>,
    settings: Mutex<PlatformSettings>,
    state: Mutex<AdapterState>,
    link: Mutex<Option<ActiveLink>>,
    /// Abort handle for the connect attempt currently in flight, if any
    attempt_abort: Mutex<Option<CancelSource>>,
    events: broadcast::Sender<WirelessEvent>,
}

impl Inner {
    fn set_state(&self, next: AdapterState) {
        let mut state = self.state.lock().unwrap();
        debug!(from = %*state, to = %next, "adapter state transition");
        *state = next;
    }

    fn emit(&self, event: WirelessEvent) {
        // A send error only means nobody is subscribed right now
        let _ = self.events.send(event);
    }

    /// Transition and publish the resulting event in one critical section.
    /// Every event-producing transition goes through here, which is what
    /// keeps event order identical to transition order under concurrency.
    fn transition_with(&self, next: AdapterState, event: WirelessEvent) {
        let mut state = self.state.lock().unwrap();
        debug!(from = %*state, to = %next, "adapter state transition");
        *state = next;
        self.emit(event);
    }

    /// Leave the Connecting phase: set the next state, drop the abort
    /// handle, and publish the outcome event (if any) in one critical
    /// section, so no window exists where the adapter looks mid-attempt
    /// without an abortable attempt.
    fn finish_attempt(&self, next: AdapterState, event: Option<WirelessEvent>) {
        let mut state = self.state.lock().unwrap();
        debug!(from = %*state, to = %next, "adapter state transition");
        *state = next;
        self.attempt_abort.lock().unwrap().take();
        if let Some(event) = event {
            self.emit(event);
        }
    }
}

/// Owns the adapter's connection state and drives its lifecycle.
///
/// All operations are asynchronous and suspend only on radio round-trips.
/// State and negotiated parameters are mutated exclusively here; callers
/// observe them through [`state`](Self::state), [`connection`](Self::connection)
/// and the event stream from [`subscribe`](Self::subscribe). The manager is
/// cheap to clone; clones share the same adapter.
///
/// Must be created inside a tokio runtime: it spawns the supervisor task
/// that watches the radio for spontaneous link drops.
#[derive(Clone)]
pub struct WirelessConnectionManager {
    inner: Arc<Inner>,
}

impl WirelessConnectionManager {
    /// Manager over the given radio, with no coprocessor monitor
    pub fn new(radio: Arc<dyn RadioLink>, settings: PlatformSettings) -> Self {
        Self::build(radio, settings, None)
    }

    /// Manager that consults the coprocessor before starting the interface
    pub fn with_coprocessor(
        radio: Arc<dyn RadioLink>,
        settings: PlatformSettings,
        coprocessor: Arc<dyn CoprocessorMonitor>,
    ) -> Self {
        Self::build(radio, settings, Some(coprocessor))
    }

    fn build(
        radio: Arc<dyn RadioLink>,
        settings: PlatformSettings,
        coprocessor: Option<Arc<dyn CoprocessorMonitor>>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let notifications = radio.subscribe();
        let inner = Arc::new(Inner {
            radio,
            coprocessor,
            settings: Mutex::new(settings),
            state: Mutex::new(AdapterState::Stopped),
            link: Mutex::new(None),
            attempt_abort: Mutex::new(None),
            events,
        });
        tokio::spawn(supervise_link(Arc::downgrade(&inner), notifications));
        Self { inner }
    }

    // ── Observation ───────────────────────────────────────────────────

    /// Current lifecycle phase
    pub fn state(&self) -> AdapterState {
        *self.inner.state.lock().unwrap()
    }

    /// Negotiated parameters of the active association, if connected
    pub fn connection(&self) -> Option<LinkParameters> {
        self.inner.link.lock().unwrap().as_ref().map(|l| l.params.clone())
    }

    /// Current antenna selection
    pub fn antenna(&self) -> AntennaType {
        self.inner.settings.lock().unwrap().antenna()
    }

    /// Subscribe to lifecycle events, delivered in transition order
    pub fn subscribe(&self) -> broadcast::Receiver<WirelessEvent> {
        self.inner.events.subscribe()
    }

    // ── Interface Lifecycle ───────────────────────────────────────────

    /// Power the interface up. With `automatically_start_network` set and a
    /// stored default access point, chains into a join attempt bounded by
    /// the configured initialization timeout; a failed auto-join leaves the
    /// interface started.
    pub async fn start_interface(&self) -> WirelessResult<()> {
        {
            let mut state = self.inner.state.lock().unwrap();
            match *state {
                AdapterState::Stopped => *state = AdapterState::Starting,
                s if s.is_busy() => {
                    return Err(WirelessError::Busy {
                        operation: "start interface",
                    })
                }
                s => {
                    return Err(WirelessError::InvalidState {
                        operation: "start interface",
                        state: s,
                    })
                }
            }
        }

        if let Some(monitor) = &self.inner.coprocessor {
            let status = monitor.status().await;
            if !status.is_ready() {
                self.inner.set_state(AdapterState::Stopped);
                return Err(WirelessError::Hardware(format!(
                    "coprocessor is {}",
                    status.label()
                )));
            }
        }

        if let Err(e) = self.inner.radio.power_on().await {
            self.inner.set_state(AdapterState::Stopped);
            return Err(e);
        }

        // Re-apply the persisted antenna selection to the freshly powered radio
        let antenna = self.inner.settings.lock().unwrap().antenna();
        if let Err(e) = self.inner.radio.set_antenna(antenna).await {
            warn!(%antenna, "could not apply antenna selection: {e}");
        }

        self.inner
            .transition_with(AdapterState::Started, WirelessEvent::InterfaceStarted);
        info!("wireless interface started");

        let auto_config = {
            let settings = self.inner.settings.lock().unwrap();
            if settings.automatically_start_network() {
                stored_connection(&settings)
                    .map(|c| c.with_timeout(settings.initialization_timeout()))
            } else {
                None
            }
        };
        if let Some(config) = auto_config {
            info!(ssid = %config.ssid, "joining stored default access point");
            if let Err(e) = self.connect(config, CancelToken::never()).await {
                warn!("default access point join failed: {e}");
            }
        }

        Ok(())
    }

    /// Release any active association and power the interface down
    pub async fn stop_interface(&self) -> WirelessResult<()> {
        let was_connected = {
            let mut state = self.inner.state.lock().unwrap();
            match *state {
                AdapterState::Stopped => {
                    return Err(WirelessError::InvalidState {
                        operation: "stop interface",
                        state: AdapterState::Stopped,
                    })
                }
                AdapterState::Starting
                | AdapterState::Connecting
                | AdapterState::Disconnecting => {
                    return Err(WirelessError::Busy {
                        operation: "stop interface",
                    })
                }
                s => {
                    let connected = s == AdapterState::Connected;
                    *state = AdapterState::Disconnecting;
                    connected
                }
            }
        };

        if was_connected {
            if let Err(e) = self.inner.radio.leave().await {
                warn!("radio leave during stop failed: {e}");
            }
            self.inner.link.lock().unwrap().take();
            self.inner.emit(WirelessEvent::Disconnected {
                reason: DisconnectReason::Requested,
            });
        }

        if let Err(e) = self.inner.radio.power_off().await {
            // The association is gone but the radio would not power down
            self.inner.set_state(AdapterState::Started);
            return Err(e);
        }

        self.inner
            .transition_with(AdapterState::Stopped, WirelessEvent::InterfaceStopped);
        info!("wireless interface stopped");
        Ok(())
    }

    // ── Connection ────────────────────────────────────────────────────

    /// Connect to an access point.
    ///
    /// The canonical entry point: every convenience path normalizes into a
    /// [`ConnectionConfig`]. Races the radio join against the config's
    /// timeout and the caller's cancellation token; whichever resolves
    /// first decides the outcome, and on timeout or cancellation the
    /// adapter reverts to `Started`.
    ///
    /// At most one attempt may be in flight; a second call fails with
    /// [`WirelessError::Busy`] without queuing.
    pub async fn connect(
        &self,
        config: ConnectionConfig,
        cancel: CancelToken,
    ) -> WirelessResult<LinkParameters> {
        if config.ssid.is_empty() {
            return Err(WirelessError::InvalidArgument("ssid must not be empty"));
        }
        if config.credential.is_empty() {
            return Err(WirelessError::InvalidArgument(
                "credential must not be empty",
            ));
        }

        // The abort handle is registered inside the same critical section as
        // the Connecting transition, so a racing disconnect always finds it.
        let (abort_source, abort_token) = CancelSource::new();
        {
            let mut state = self.inner.state.lock().unwrap();
            match *state {
                AdapterState::Started => {
                    *state = AdapterState::Connecting;
                    *self.inner.attempt_abort.lock().unwrap() = Some(abort_source);
                }
                AdapterState::Connecting => {
                    return Err(WirelessError::Busy {
                        operation: "connect",
                    })
                }
                s => {
                    return Err(WirelessError::InvalidState {
                        operation: "connect",
                        state: s,
                    })
                }
            }
        }

        info!(ssid = %config.ssid, "connecting");
        let outcome = attempt_join(&self.inner, &config, &cancel, &abort_token).await;

        match outcome {
            Ok(params) => {
                *self.inner.link.lock().unwrap() = Some(ActiveLink {
                    config: config.clone(),
                    params: params.clone(),
                });
                self.inner.finish_attempt(
                    AdapterState::Connected,
                    Some(WirelessEvent::Connected(ConnectionDetail::from_link(
                        &config.ssid,
                        &params,
                    ))),
                );
                info!(ssid = %config.ssid, address = %params.address, "connected");
                Ok(params)
            }
            Err(e) => {
                self.inner.finish_attempt(AdapterState::Started, None);
                warn!(ssid = %config.ssid, "connect attempt failed: {e}");
                Err(e)
            }
        }
    }

    /// Connect using the stored default access point and credential
    pub async fn connect_stored(&self, cancel: CancelToken) -> WirelessResult<LinkParameters> {
        let config = {
            let settings = self.inner.settings.lock().unwrap();
            stored_connection(&settings)
        };
        let Some(config) = config else {
            return Err(WirelessError::Settings(
                "no default access point stored".into(),
            ));
        };
        self.connect(config, cancel).await
    }

    /// Tear down the active association.
    ///
    /// While an attempt is in flight this aborts it instead (the pending
    /// `connect` resolves cancelled). Calling while already disconnected is
    /// a benign no-op. With `turn_off_interface` the interface is stopped
    /// after the teardown.
    pub async fn disconnect(&self, turn_off_interface: bool) -> WirelessResult<Disconnection> {
        enum Action {
            Abort,
            TearDown,
            Noop,
        }

        let action = {
            let mut state = self.inner.state.lock().unwrap();
            match *state {
                AdapterState::Connecting => Action::Abort,
                AdapterState::Connected => {
                    *state = AdapterState::Disconnecting;
                    Action::TearDown
                }
                AdapterState::Disconnecting => {
                    return Err(WirelessError::Busy {
                        operation: "disconnect",
                    })
                }
                _ => Action::Noop,
            }
        };

        match action {
            Action::Abort => {
                if let Some(abort) = self.inner.attempt_abort.lock().unwrap().as_ref() {
                    abort.cancel();
                }
                info!("aborted in-flight connect attempt");
                Ok(Disconnection::AttemptAborted)
            }
            Action::Noop => Ok(Disconnection::NotConnected),
            Action::TearDown => {
                if let Err(e) = self.inner.radio.leave().await {
                    warn!("radio leave failed: {e}");
                }
                self.inner.link.lock().unwrap().take();
                self.inner.transition_with(
                    AdapterState::Started,
                    WirelessEvent::Disconnected {
                        reason: DisconnectReason::Requested,
                    },
                );
                info!("disconnected");
                if turn_off_interface {
                    self.stop_interface().await?;
                }
                Ok(Disconnection::Disconnected)
            }
        }
    }

    // ── Scan ──────────────────────────────────────────────────────────

    /// Survey visible networks, in discovery order.
    ///
    /// The interface must be running. `timeout: None` waits until the
    /// radio's sweep completes or the token fires.
    pub async fn scan(
        &self,
        timeout: Option<Duration>,
        cancel: CancelToken,
    ) -> WirelessResult<Vec<NetworkDescriptor>> {
        {
            let state = self.inner.state.lock().unwrap();
            match *state {
                AdapterState::Started | AdapterState::Connected => {}
                AdapterState::Starting
                | AdapterState::Connecting
                | AdapterState::Disconnecting => {
                    return Err(WirelessError::Busy { operation: "scan" })
                }
                s => {
                    return Err(WirelessError::InvalidState {
                        operation: "scan",
                        state: s,
                    })
                }
            }
        }

        debug!("scan requested");
        let sweep = self.inner.radio.scan();
        tokio::pin!(sweep);
        tokio::select! {
            result = &mut sweep => result,
            _ = cancel.cancelled() => Err(WirelessError::Cancelled),
            elapsed = deadline(timeout) => Err(WirelessError::Timeout(elapsed)),
        }
    }

    // ── Antenna ───────────────────────────────────────────────────────

    /// Route the RF front end. With `persist` the selection is written
    /// through the settings store and survives an adapter restart.
    pub async fn set_antenna(&self, antenna: AntennaType, persist: bool) -> WirelessResult<()> {
        self.inner.radio.set_antenna(antenna).await?;
        let snapshot = {
            let mut settings = self.inner.settings.lock().unwrap();
            settings.set_antenna(antenna);
            persist.then(|| settings.clone())
        };
        if let Some(settings) = snapshot {
            settings.save().await?;
            info!(%antenna, "antenna selection persisted");
        }
        Ok(())
    }
}

/// Build a connect config from the stored default access point, carrying the
/// store's reconnection preferences.
fn stored_connection(settings: &PlatformSettings) -> Option<ConnectionConfig> {
    let ssid = settings.default_access_point()?;
    let policy = if settings.automatically_reconnect() {
        ReconnectionPolicy::Automatic {
            max_retries: settings.maximum_network_retry_count(),
        }
    } else {
        ReconnectionPolicy::None
    };
    Some(ConnectionConfig::new(ssid, settings.default_credential()).with_policy(policy))
}

/// Race one radio join against the timeout and both cancellation signals.
/// Loses revert nothing here; the caller owns the state transition.
async fn attempt_join(
    inner: &Inner,
    config: &ConnectionConfig,
    cancel: &CancelToken,
    abort: &CancelToken,
) -> WirelessResult<LinkParameters> {
    let join = inner.radio.join(&config.ssid, &config.credential);
    tokio::pin!(join);
    tokio::select! {
        result = &mut join => result,
        _ = cancel.cancelled() => {
            abandon_join(inner).await;
            Err(WirelessError::Cancelled)
        }
        _ = abort.cancelled() => {
            abandon_join(inner).await;
            Err(WirelessError::Cancelled)
        }
        elapsed = deadline(config.timeout) => {
            abandon_join(inner).await;
            Err(WirelessError::Timeout(elapsed))
        }
    }
}

/// Resolves after `timeout`, or never when there is none
async fn deadline(timeout: Option<Duration>) -> Duration {
    match timeout {
        Some(d) => {
            tokio::time::sleep(d).await;
            d
        }
        None => futures::future::pending().await,
    }
}

/// Tell the radio to stop a join we no longer want. Best effort; the
/// attempt is already being reported as failed.
async fn abandon_join(inner: &Inner) {
    if let Err(e) = inner.radio.leave().await {
        debug!("radio abort of abandoned join failed: {e}");
    }
}

// ── Link Supervision ──────────────────────────────────────────────────

/// Background task watching the radio for unsolicited notifications.
/// Holds only a weak handle so dropping the last manager ends it.
async fn supervise_link(
    weak: Weak<Inner>,
    mut notifications: broadcast::Receiver<LinkNotification>,
) {
    loop {
        let notification = match notifications.recv().await {
            Ok(n) => n,
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                warn!(missed, "link notifications lagged");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => return,
        };
        let Some(inner) = weak.upgrade() else { return };
        match notification {
            LinkNotification::TimeSynchronized(at) => {
                inner.emit(WirelessEvent::TimeSynchronized(at));
            }
            LinkNotification::Dropped { reason } => handle_link_drop(&inner, &reason).await,
        }
    }
}

/// React to a spontaneous link loss: report it, then re-join autonomously
/// when the active policy allows, with doubling back-off and a bounded
/// retry budget. Retries surface only through events; there is no pending
/// caller operation left to resolve.
async fn handle_link_drop(inner: &Arc<Inner>, reason: &str) {
    let config = {
        let mut state = inner.state.lock().unwrap();
        // Drops caused by our own teardown arrive in other states and are
        // already reported by the operation that requested them.
        if *state != AdapterState::Connected {
            return;
        }
        *state = AdapterState::Started;
        let config = inner.link.lock().unwrap().take().map(|l| l.config);
        inner.emit(WirelessEvent::Disconnected {
            reason: DisconnectReason::LinkLost,
        });
        config
    };

    warn!(reason, "link lost");
    let Some(config) = config else { return };
    let ReconnectionPolicy::Automatic { max_retries } = config.policy else {
        info!("reconnection policy is none; staying disconnected");
        return;
    };

    let mut backoff = RECONNECT_BACKOFF_BASE;
    for attempt in 1..=max_retries {
        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(RECONNECT_BACKOFF_CAP);

        // The interface may have been stopped, or a caller may have begun
        // its own attempt, while we backed off.
        let (abort_source, abort_token) = CancelSource::new();
        {
            let mut state = inner.state.lock().unwrap();
            if *state != AdapterState::Started {
                info!("adapter no longer idle; ending automatic reconnection");
                return;
            }
            *state = AdapterState::Connecting;
            *inner.attempt_abort.lock().unwrap() = Some(abort_source);
        }

        info!(attempt, max_retries, ssid = %config.ssid, "automatic reconnection attempt");
        let outcome = attempt_join(inner, &config, &CancelToken::never(), &abort_token).await;

        match outcome {
            Ok(params) => {
                *inner.link.lock().unwrap() = Some(ActiveLink {
                    config: config.clone(),
                    params: params.clone(),
                });
                inner.finish_attempt(
                    AdapterState::Connected,
                    Some(WirelessEvent::Connected(ConnectionDetail::from_link(
                        &config.ssid,
                        &params,
                    ))),
                );
                info!(ssid = %config.ssid, "reconnected");
                return;
            }
            Err(WirelessError::Cancelled) => {
                inner.finish_attempt(AdapterState::Started, None);
                info!("automatic reconnection aborted by caller");
                return;
            }
            Err(e) => {
                inner.finish_attempt(AdapterState::Started, None);
                warn!(attempt, "reconnection attempt failed: {e}");
            }
        }
    }

    warn!(max_retries, "reconnection retries exhausted");
    inner.emit(WirelessEvent::Disconnected {
        reason: DisconnectReason::RetriesExhausted,
    });
}
