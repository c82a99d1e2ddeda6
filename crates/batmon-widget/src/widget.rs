//! Battery widget: polling controller and retained state
//!
//! One widget owns one surface. Polling runs as a single spawned task that
//! awaits each fetch before waiting for the next tick, and every cycle
//! (polled or on-demand) runs under one cycle lock, so requests never
//! overlap; a slow response simply delays the next cycle.

use crate::client::StatusClient;
use crate::config::{DEFAULT_POLL_INTERVAL_SECS, TargetIds, WidgetConfig};
use crate::normalize::{NormalizedStatus, normalize};
use crate::render::Renderer;
use crate::surface::Surface;
use crate::WidgetError;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Surface plus the last status rendered onto it
struct WidgetState<S> {
    surface: S,
    renderer: Renderer,
    last: Option<NormalizedStatus>,
}

impl<S: Surface> WidgetState<S> {
    fn apply(&mut self, raw: &Value) {
        let status = normalize(raw);
        if status.is_unavailable() {
            self.show_unavailable();
            return;
        }

        self.renderer.render(&mut self.surface, &status);
        self.last = Some(status);
    }

    fn show_unavailable(&mut self) {
        self.renderer.render_unavailable(&mut self.surface);
        self.last = None;
    }
}

/// Battery status widget bound to a display surface
pub struct BatteryWidget<S: Surface> {
    shared: Arc<Mutex<WidgetState<S>>>,
    /// Held across fetch and render of each cycle
    cycle: Arc<AsyncMutex<()>>,
    client: StatusClient,
    interval: Duration,
    poller: Option<JoinHandle<()>>,
}

impl<S: Surface> BatteryWidget<S> {
    /// Create a widget from configuration
    pub fn new(config: &WidgetConfig, surface: S) -> Result<Self, WidgetError> {
        config.validate()?;
        let client = StatusClient::new(config.endpoint.clone(), config.request_timeout())?;
        Ok(Self::with_client(
            client,
            config.poll_interval(),
            config.targets.clone(),
            surface,
        ))
    }

    /// Create a widget around an existing client
    ///
    /// A zero interval falls back to the default poll interval.
    pub fn with_client(
        client: StatusClient,
        interval: Duration,
        targets: TargetIds,
        surface: S,
    ) -> Self {
        let interval = if interval.is_zero() {
            tracing::warn!(
                "Zero poll interval, using {}s",
                DEFAULT_POLL_INTERVAL_SECS
            );
            Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS)
        } else {
            interval
        };

        let state = WidgetState {
            surface,
            renderer: Renderer::new(targets),
            last: None,
        };

        Self {
            shared: Arc::new(Mutex::new(state)),
            cycle: Arc::new(AsyncMutex::new(())),
            client,
            interval,
            poller: None,
        }
    }

    /// Start polling: one cycle right away, then one per interval.
    ///
    /// Restarting cancels the previous poller first. Must be called from
    /// within a tokio runtime.
    pub fn start(&mut self) {
        self.stop();

        let client = self.client.clone();
        let shared = Arc::clone(&self.shared);
        let cycle = Arc::clone(&self.cycle);
        let period = self.interval;

        self.poller = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                poll_once(&client, &shared, &cycle).await;
            }
        }));

        tracing::info!(
            "Battery polling started for {} every {:?}",
            self.client.endpoint(),
            self.interval
        );
    }

    /// Stop polling. The last rendered output stays on the surface.
    pub fn stop(&mut self) {
        if let Some(handle) = self.poller.take() {
            handle.abort();
            tracing::debug!("Battery polling stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.poller.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Run a single fetch-and-render cycle now
    ///
    /// Waits for an in-flight poll to finish first, so the newest
    /// response is always the one left on the surface.
    pub async fn refresh(&self) {
        poll_once(&self.client, &self.shared, &self.cycle).await;
    }

    /// Render externally pushed data. Falsy payloads are ignored.
    pub fn push_state(&self, raw: &Value) {
        if !is_truthy(raw) {
            return;
        }
        lock(&self.shared).apply(raw);
    }

    /// Last successfully rendered status; `None` while unknown
    pub fn state(&self) -> Option<NormalizedStatus> {
        lock(&self.shared).last.clone()
    }

    /// Access the surface, e.g. to draw it
    pub fn with_surface<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut lock(&self.shared).surface)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl<S: Surface> Drop for BatteryWidget<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_once<S: Surface>(
    client: &StatusClient,
    shared: &Mutex<WidgetState<S>>,
    cycle: &AsyncMutex<()>,
) {
    let _cycle = cycle.lock().await;

    match client.fetch().await {
        Ok(payload) => {
            tracing::debug!("Battery status received");
            lock(shared).apply(&payload);
        }
        Err(e) => {
            tracing::warn!(error = %e, "Battery status request failed");
            lock(shared).show_unavailable();
        }
    }
}

// State is overwritten wholesale on every render, so a poisoned lock holds
// nothing worth discarding.
fn lock<S>(shared: &Mutex<WidgetState<S>>) -> MutexGuard<'_, WidgetState<S>> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
