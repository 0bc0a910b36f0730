//! Sensor lifecycle: scheduling, metrics, result history and recovery

use std::sync::{Arc, Weak};

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::buffer::ResultBuffer;
use crate::error::{Result, SensorError};
use crate::health::HealthTracker;
use crate::recovery::BackoffPolicy;
use crate::sensor::Sensor;
use crate::types::{SensorConfig, SensorConfigUpdate, SensorMetrics, SensorResult, SensorStatus};

/// Drives a [`Sensor`] through its lifecycle
///
/// Cheap to clone; clones share the same sensor, metrics and history.
pub struct SensorRuntime<S: Sensor> {
    inner: Arc<RuntimeInner<S>>,
}

impl<S: Sensor> Clone for SensorRuntime<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct RuntimeInner<S> {
    sensor: Arc<S>,
    config: RwLock<SensorConfig>,
    status: RwLock<SensorStatus>,
    state: Mutex<RuntimeState>,
    /// Held for the duration of a detection pass so cycles never overlap
    cycle_lock: AsyncMutex<()>,
    trigger: AsyncMutex<Option<Trigger>>,
}

struct RuntimeState {
    metrics: SensorMetrics,
    buffer: ResultBuffer,
    health: HealthTracker,
}

struct Trigger {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl Trigger {
    async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        let _ = self.task.await;
    }
}

impl<S: Sensor> SensorRuntime<S> {
    /// Wrap a sensor; the configuration is validated first
    pub fn new(sensor: S, config: SensorConfig) -> Result<Self> {
        Self::with_shared(Arc::new(sensor), config)
    }

    /// Wrap a sensor the caller keeps a handle to
    pub fn with_shared(sensor: Arc<S>, config: SensorConfig) -> Result<Self> {
        config.validate()?;
        let buffer = ResultBuffer::new(config.buffer_size);
        Ok(Self {
            inner: Arc::new(RuntimeInner {
                sensor,
                config: RwLock::new(config),
                status: RwLock::new(SensorStatus::Inactive),
                state: Mutex::new(RuntimeState {
                    metrics: SensorMetrics::default(),
                    buffer,
                    health: HealthTracker::new(),
                }),
                cycle_lock: AsyncMutex::new(()),
                trigger: AsyncMutex::new(None),
            }),
        })
    }

    /// The concrete sensor
    pub fn sensor(&self) -> &Arc<S> {
        &self.inner.sensor
    }

    pub fn name(&self) -> &str {
        self.inner.sensor.name()
    }

    pub fn get_status(&self) -> SensorStatus {
        *self.inner.status.read()
    }

    pub fn get_config(&self) -> SensorConfig {
        self.inner.config.read().clone()
    }

    pub fn get_metrics(&self) -> SensorMetrics {
        self.inner.state.lock().metrics.clone()
    }

    pub fn reset_metrics(&self) {
        self.inner.state.lock().metrics = SensorMetrics::default();
        debug!(sensor = %self.name(), "Metrics reset");
    }

    /// Up to `n` most recent results, oldest first
    pub fn get_recent_results(&self, n: usize) -> Vec<SensorResult> {
        self.inner.state.lock().buffer.recent(n)
    }

    pub fn is_healthy(&self) -> bool {
        let sensitivity = self.inner.config.read().sensitivity;
        self.inner.state.lock().health.is_healthy(sensitivity)
    }

    /// Activate and arm the periodic trigger. No-op when already active.
    pub async fn start_monitoring(&self) {
        let mut trigger = self.inner.trigger.lock().await;
        if *self.inner.status.read() == SensorStatus::Active {
            debug!(sensor = %self.name(), "Monitoring already active");
            return;
        }

        *trigger = Some(self.arm());
        *self.inner.status.write() = SensorStatus::Active;
        info!(
            sensor = %self.name(),
            interval_ms = self.inner.config.read().monitoring_interval_ms,
            "Monitoring started"
        );
    }

    /// Disarm the trigger and deactivate. An in-flight cycle runs to completion.
    pub async fn stop_monitoring(&self) {
        let armed = {
            let mut trigger = self.inner.trigger.lock().await;
            if *self.inner.status.read() == SensorStatus::Inactive {
                debug!(sensor = %self.name(), "Monitoring already inactive");
                return;
            }
            *self.inner.status.write() = SensorStatus::Inactive;
            trigger.take()
        };

        if let Some(armed) = armed {
            armed.shutdown().await;
        }
        info!(sensor = %self.name(), "Monitoring stopped");
    }

    /// Run one monitoring cycle
    ///
    /// On failure the metrics record it and the error is returned to the caller;
    /// follow up with [`SensorRuntime::handle_failure`] to run recovery.
    pub async fn monitor(&self) -> Result<SensorResult> {
        let _cycle = self.inner.cycle_lock.lock().await;
        let started = Instant::now();
        debug!(sensor = %self.name(), "Monitoring cycle started");

        match self.inner.sensor.perform_monitoring().await {
            Ok(result) => {
                let elapsed = started.elapsed();
                let mut state = self.inner.state.lock();
                state.metrics.record_success(elapsed, Utc::now());
                state.health.record_success();
                state.buffer.push(result.clone());
                debug!(
                    sensor = %self.name(),
                    status = ?result.status,
                    issues = result.issues.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Monitoring cycle completed"
                );
                Ok(result)
            }
            Err(err) => {
                {
                    let mut state = self.inner.state.lock();
                    state.metrics.record_failure(&err);
                    state.health.record_failure();
                }
                error!(sensor = %self.name(), error = %err, "Monitoring cycle failed");
                Err(err)
            }
        }
    }

    /// Bounded recovery after a failed cycle
    ///
    /// Each failed attempt waits `base * 2^attempt` before the next one, up to
    /// `max_retries` attempts. Success reactivates the sensor; exhaustion leaves
    /// the lifecycle state alone and marks the sensor unhealthy.
    pub async fn handle_failure(&self, error: &SensorError) -> Result<()> {
        self.recover_with_backoff(error, true).await
    }

    /// Merge a partial configuration; rearms the trigger if the interval changed
    pub async fn update_config(&self, update: SensorConfigUpdate) -> Result<()> {
        let (previous, current) = {
            let mut config = self.inner.config.write();
            let merged = config.merge(&update)?;
            let previous = std::mem::replace(&mut *config, merged.clone());
            (previous, merged)
        };

        if previous.buffer_size != current.buffer_size {
            self.inner.state.lock().buffer.resize(current.buffer_size);
        }

        if previous.monitoring_interval_ms != current.monitoring_interval_ms {
            let replaced = {
                let mut trigger = self.inner.trigger.lock().await;
                if *self.inner.status.read() == SensorStatus::Active {
                    trigger.replace(self.arm())
                } else {
                    None
                }
            };
            if let Some(old) = replaced {
                old.shutdown().await;
                info!(
                    sensor = %self.name(),
                    interval_ms = current.monitoring_interval_ms,
                    "Monitoring trigger rearmed"
                );
            }
        }

        debug!(sensor = %self.name(), ?current, "Configuration updated");
        Ok(())
    }

    async fn recover_with_backoff(&self, error: &SensorError, reactivate: bool) -> Result<()> {
        let policy = BackoffPolicy::from_config(&self.get_config());
        let mut last_error = error.to_string();

        for attempt in 0..policy.max_retries {
            warn!(
                sensor = %self.name(),
                attempt = attempt + 1,
                max_retries = policy.max_retries,
                "Attempting recovery"
            );

            let outcome = {
                let _cycle = self.inner.cycle_lock.lock().await;
                self.inner.sensor.recover(error).await
            };

            match outcome {
                Ok(()) => {
                    self.inner.state.lock().health.reset();
                    if reactivate {
                        self.start_monitoring().await;
                    }
                    info!(sensor = %self.name(), attempt = attempt + 1, "Recovery succeeded");
                    return Ok(());
                }
                Err(err) => {
                    last_error = err.to_string();
                    if policy.has_next(attempt) {
                        let delay = policy.delay_for(attempt);
                        warn!(
                            sensor = %self.name(),
                            error = %err,
                            delay_ms = delay.as_millis() as u64,
                            "Recovery attempt failed, backing off"
                        );
                        time::sleep(delay).await;
                    }
                }
            }
        }

        self.inner.state.lock().health.mark_unhealthy();
        error!(
            sensor = %self.name(),
            attempts = policy.max_retries,
            error = %last_error,
            "Recovery exhausted, sensor marked unhealthy"
        );
        Err(SensorError::RecoveryExhausted {
            attempts: policy.max_retries,
            last_error,
        })
    }

    fn arm(&self) -> Trigger {
        let period = self.inner.config.read().monitoring_interval();
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let weak: Weak<RuntimeInner<S>> = Arc::downgrade(&self.inner);

        let task = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let Some(inner) = weak.upgrade() else { break };
                        let runtime = SensorRuntime { inner };
                        if let Err(err) = runtime.monitor().await {
                            let _ = runtime.recover_with_backoff(&err, false).await;
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        debug!("Monitoring trigger shutting down");
                        break;
                    }
                }
            }
        });

        Trigger { shutdown_tx, task }
    }
}
