//! Lifecycle behaviour of a sensor driven through the public API

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use codesense_sensors::{
    Result, Sensor, SensorConfig, SensorConfigUpdate, SensorError, SensorResult, SensorRuntime,
    SensorStatus,
};

/// Fails the first `failures` cycles, then succeeds
struct FlakySensor {
    failures: u32,
    calls: AtomicU32,
}

impl FlakySensor {
    fn new(failures: u32) -> Self {
        Self {
            failures,
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl Sensor for FlakySensor {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn perform_monitoring(&self) -> Result<SensorResult> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(SensorError::detection("flaky", format!("failure #{}", call)));
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
        let mut metrics = BTreeMap::new();
        metrics.insert("call".to_string(), call as f64);
        Ok(SensorResult::from_issues(Vec::new(), metrics))
    }
}

fn config(buffer_size: usize) -> SensorConfig {
    SensorConfig {
        monitoring_interval_ms: 15,
        sensitivity: 0.7,
        max_retries: 3,
        buffer_size,
        retry_base_delay_ms: 1,
    }
}

#[tokio::test]
async fn test_failed_cycle_then_default_recovery() {
    // call 0 fails in monitor(); call 1 is the recovery pass and succeeds
    let runtime = SensorRuntime::new(FlakySensor::new(1), config(5)).unwrap();

    let err = runtime.monitor().await.unwrap_err();
    let metrics = runtime.get_metrics();
    assert_eq!(metrics.successful_cycles, 0);
    assert_eq!(metrics.failed_cycles, 1);

    runtime.handle_failure(&err).await.unwrap();
    assert_eq!(runtime.get_status(), SensorStatus::Active);
    assert!(runtime.is_healthy());

    runtime.stop_monitoring().await;
}

#[tokio::test]
async fn test_recovery_retries_with_backoff_until_success() {
    // monitor fails, then two recovery attempts fail, third succeeds
    let runtime = SensorRuntime::new(FlakySensor::new(3), config(5)).unwrap();

    let err = runtime.monitor().await.unwrap_err();
    runtime.handle_failure(&err).await.unwrap();

    assert_eq!(runtime.sensor().calls.load(Ordering::SeqCst), 4);
    assert!(runtime.is_healthy());
    runtime.stop_monitoring().await;
}

#[tokio::test]
async fn test_history_is_bounded_by_buffer_size() {
    let runtime = SensorRuntime::new(FlakySensor::new(0), config(2)).unwrap();
    for _ in 0..5 {
        runtime.monitor().await.unwrap();
    }

    let recent = runtime.get_recent_results(10);
    assert_eq!(recent.len(), 2);
    assert!(recent[0].timestamp <= recent[1].timestamp);
    assert_eq!(recent[1].metric("call"), Some(4.0));
}

#[tokio::test]
async fn test_concurrent_monitor_calls_do_not_overlap() {
    let runtime = SensorRuntime::new(FlakySensor::new(0), config(50)).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let runtime = runtime.clone();
            tokio::spawn(async move { runtime.monitor().await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let metrics = runtime.get_metrics();
    assert_eq!(metrics.successful_cycles, 8);
    let calls: Vec<f64> = runtime
        .get_recent_results(8)
        .iter()
        .filter_map(|r| r.metric("call"))
        .collect();
    assert_eq!(calls, (0..8).map(|c| c as f64).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_shrinking_buffer_drops_oldest() {
    let runtime = SensorRuntime::new(FlakySensor::new(0), config(5)).unwrap();
    for _ in 0..5 {
        runtime.monitor().await.unwrap();
    }

    runtime
        .update_config(SensorConfigUpdate {
            buffer_size: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();

    let recent = runtime.get_recent_results(10);
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].metric("call"), Some(3.0));
}

#[tokio::test]
async fn test_shared_sensor_handle() {
    let sensor = Arc::new(FlakySensor::new(0));
    let runtime = SensorRuntime::with_shared(Arc::clone(&sensor), config(5)).unwrap();

    runtime.monitor().await.unwrap();
    assert_eq!(sensor.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_periodic_failures_are_recovered_in_background() {
    let runtime = SensorRuntime::new(FlakySensor::new(1), config(5)).unwrap();
    runtime.start_monitoring().await;
    tokio::time::sleep(Duration::from_millis(120)).await;
    runtime.stop_monitoring().await;

    let metrics = runtime.get_metrics();
    assert_eq!(metrics.failed_cycles, 1);
    assert!(metrics.successful_cycles >= 1);
    assert!(runtime.is_healthy());
    assert_eq!(runtime.get_status(), SensorStatus::Inactive);
}
