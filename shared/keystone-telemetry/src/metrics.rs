//! Metric instruments
//!
//! Atomic counter/gauge and a mutex-sampled histogram, collected in a named
//! set so the pull-based scrape endpoint can enumerate them. Registering an
//! existing name returns the existing instrument.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

/// Monotonic counter.
#[derive(Clone)]
pub struct Counter {
    value: Arc<AtomicU64>,
    name: String,
    help: String,
}

impl Counter {
    pub fn new(name: &str, help: &str) -> Self {
        Self {
            value: Arc::new(AtomicU64::new(0)),
            name: name.to_string(),
            help: help.to_string(),
        }
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Gauge that can move both ways.
#[derive(Clone)]
pub struct Gauge {
    value: Arc<AtomicU64>,
    name: String,
    help: String,
}

impl Gauge {
    pub fn new(name: &str, help: &str) -> Self {
        Self {
            value: Arc::new(AtomicU64::new(0)),
            name: name.to_string(),
            help: help.to_string(),
        }
    }

    pub fn set(&self, val: u64) {
        self.value.store(val, Ordering::Relaxed);
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec(&self) {
        self.value.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Histogram keeping a bounded sample window for percentile calculation.
#[derive(Clone)]
pub struct Histogram {
    samples: Arc<parking_lot::Mutex<Vec<f64>>>,
    name: String,
    help: String,
    max_samples: usize,
}

impl Histogram {
    pub fn new(name: &str, help: &str) -> Self {
        Self {
            samples: Arc::new(parking_lot::Mutex::new(Vec::with_capacity(1000))),
            name: name.to_string(),
            help: help.to_string(),
            max_samples: 10000,
        }
    }

    pub fn record(&self, value: f64) {
        let mut samples = self.samples.lock();
        if samples.len() >= self.max_samples {
            samples.remove(0);
        }
        samples.push(value);
    }

    pub fn percentile(&self, p: f64) -> f64 {
        let mut samples = self.samples.lock();
        if samples.is_empty() {
            return 0.0;
        }
        samples.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let idx = ((samples.len() as f64) * p / 100.0) as usize;
        samples[idx.min(samples.len() - 1)]
    }

    pub fn mean(&self) -> f64 {
        let samples = self.samples.lock();
        if samples.is_empty() {
            return 0.0;
        }
        samples.iter().sum::<f64>() / samples.len() as f64
    }

    pub fn sum(&self) -> f64 {
        self.samples.lock().iter().sum()
    }

    pub fn count(&self) -> usize {
        self.samples.lock().len()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Named instrument registry backing the metric pipeline.
#[derive(Clone, Default)]
pub struct MetricSet {
    counters: Arc<DashMap<String, Counter>>,
    gauges: Arc<DashMap<String, Gauge>>,
    histograms: Arc<DashMap<String, Histogram>>,
}

impl MetricSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter registered under `name`; an existing name returns the
    /// existing instrument.
    pub fn counter(&self, name: &str, help: &str) -> Counter {
        self.counters
            .entry(name.to_string())
            .or_insert_with(|| Counter::new(name, help))
            .clone()
    }

    pub fn gauge(&self, name: &str, help: &str) -> Gauge {
        self.gauges
            .entry(name.to_string())
            .or_insert_with(|| Gauge::new(name, help))
            .clone()
    }

    pub fn histogram(&self, name: &str, help: &str) -> Histogram {
        self.histograms
            .entry(name.to_string())
            .or_insert_with(|| Histogram::new(name, help))
            .clone()
    }

    /// Render every instrument in Prometheus text exposition format.
    /// Output is name-sorted for deterministic scrapes.
    pub fn render_prometheus(&self, prefix: &str) -> String {
        let mut output = String::new();

        let mut counters: Vec<Counter> =
            self.counters.iter().map(|e| e.value().clone()).collect();
        counters.sort_by(|a, b| a.name.cmp(&b.name));
        for counter in counters {
            let name = metric_name(prefix, &counter.name);
            let _ = writeln!(output, "# HELP {} {}", name, counter.help);
            let _ = writeln!(output, "# TYPE {} counter", name);
            let _ = writeln!(output, "{} {}\n", name, counter.get());
        }

        let mut gauges: Vec<Gauge> = self.gauges.iter().map(|e| e.value().clone()).collect();
        gauges.sort_by(|a, b| a.name.cmp(&b.name));
        for gauge in gauges {
            let name = metric_name(prefix, &gauge.name);
            let _ = writeln!(output, "# HELP {} {}", name, gauge.help);
            let _ = writeln!(output, "# TYPE {} gauge", name);
            let _ = writeln!(output, "{} {}\n", name, gauge.get());
        }

        let mut histograms: Vec<Histogram> =
            self.histograms.iter().map(|e| e.value().clone()).collect();
        histograms.sort_by(|a, b| a.name.cmp(&b.name));
        for histogram in histograms {
            let name = metric_name(prefix, &histogram.name);
            let _ = writeln!(output, "# HELP {} {}", name, histogram.help);
            let _ = writeln!(output, "# TYPE {} summary", name);
            for quantile in [50.0, 90.0, 99.0] {
                let _ = writeln!(
                    output,
                    "{}{{quantile=\"{}\"}} {}",
                    name,
                    quantile / 100.0,
                    histogram.percentile(quantile)
                );
            }
            let _ = writeln!(output, "{}_sum {}", name, histogram.sum());
            let _ = writeln!(output, "{}_count {}\n", name, histogram.count());
        }

        output
    }
}

fn metric_name(prefix: &str, name: &str) -> String {
    let raw = if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}_{}", prefix, name)
    };
    raw.replace('-', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter() {
        let counter = Counter::new("test_counter", "test");
        assert_eq!(counter.get(), 0);
        counter.inc();
        assert_eq!(counter.get(), 1);
        counter.add(5);
        assert_eq!(counter.get(), 6);
    }

    #[test]
    fn test_gauge() {
        let gauge = Gauge::new("test_gauge", "test");
        gauge.set(10);
        assert_eq!(gauge.get(), 10);
        gauge.inc();
        assert_eq!(gauge.get(), 11);
        gauge.dec();
        assert_eq!(gauge.get(), 10);
    }

    #[test]
    fn test_histogram() {
        let hist = Histogram::new("test_histogram", "test");
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            hist.record(v);
        }
        assert!((hist.mean() - 3.0).abs() < 0.001);
        assert!((hist.percentile(50.0) - 3.0).abs() < 0.001);
        assert_eq!(hist.count(), 5);
    }

    #[test]
    fn set_returns_existing_instrument_for_known_name() {
        let set = MetricSet::new();
        set.counter("requests_total", "Total requests").inc();
        set.counter("requests_total", "Total requests").inc();
        assert_eq!(set.counter("requests_total", "Total requests").get(), 2);
    }

    #[test]
    fn render_emits_exposition_format() {
        let set = MetricSet::new();
        set.counter("requests_total", "Total requests").add(3);
        set.gauge("inflight", "In-flight requests").set(2);

        let output = set.render_prometheus("orders_api");
        assert!(output.contains("# HELP orders_api_requests_total Total requests"));
        assert!(output.contains("# TYPE orders_api_requests_total counter"));
        assert!(output.contains("orders_api_requests_total 3"));
        assert!(output.contains("# TYPE orders_api_inflight gauge"));
        assert!(output.contains("orders_api_inflight 2"));
    }
}
