use lazy_static::lazy_static;
use prometheus::{Counter, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder};
use std::sync::OnceLock;
use std::time::{Instant, SystemTime};

// 全局服务启动时间
static SERVICE_START_TIME: OnceLock<SystemTime> = OnceLock::new();

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    pub static ref REQUEST_COUNTER: Counter = Counter::with_opts(
        Opts::new("meme_requests_total", "Total number of meme requests")
    ).unwrap();

    pub static ref RESPONSE_TIME: Histogram = Histogram::with_opts(
        HistogramOpts::new("meme_response_duration_seconds", "Response time for meme requests")
    ).unwrap();

    pub static ref UPSTREAM_FAILURES: Counter = Counter::with_opts(
        Opts::new("meme_upstream_failures_total", "Failed requests to the upstream meme API or image hosts")
    ).unwrap();

    pub static ref ARCHIVE_RUNS: Counter = Counter::with_opts(
        Opts::new("meme_archive_runs_total", "Completed archive pipeline runs")
    ).unwrap();

    pub static ref DOWNLOADED_BYTES: Counter = Counter::with_opts(
        Opts::new("meme_downloaded_bytes_total", "Bytes of meme images written to disk")
    ).unwrap();

    pub static ref SERVICE_UPTIME_SECONDS: Gauge = Gauge::with_opts(
        Opts::new("service_uptime_seconds", "Service uptime in seconds")
    ).unwrap();
}

pub fn init_metrics() -> prometheus::Result<()> {
    REGISTRY.register(Box::new(REQUEST_COUNTER.clone()))?;
    REGISTRY.register(Box::new(RESPONSE_TIME.clone()))?;
    REGISTRY.register(Box::new(UPSTREAM_FAILURES.clone()))?;
    REGISTRY.register(Box::new(ARCHIVE_RUNS.clone()))?;
    REGISTRY.register(Box::new(DOWNLOADED_BYTES.clone()))?;
    REGISTRY.register(Box::new(SERVICE_UPTIME_SECONDS.clone()))?;
    Ok(())
}

/// 设置服务启动时间
pub fn set_service_start_time(start_time: SystemTime) {
    SERVICE_START_TIME.set(start_time).ok();
}

pub fn get_metrics() -> String {
    // 按需更新服务运行时间
    if let Some(start_time) = SERVICE_START_TIME.get() {
        if let Ok(uptime) = start_time.elapsed() {
            SERVICE_UPTIME_SECONDS.set(uptime.as_secs() as f64);
        }
    }

    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("编码指标失败: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

pub struct Timer {
    start: Instant,
    histogram: &'static Histogram,
}

impl Timer {
    pub fn new(histogram: &'static Histogram) -> Self {
        Self {
            start: Instant::now(),
            histogram,
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        self.histogram.observe(duration.as_secs_f64());
    }
}
