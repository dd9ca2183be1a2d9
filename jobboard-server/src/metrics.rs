//! Admission and cache counters exported in Prometheus text format
//!
//! Plain atomics, no allocation on the recording path.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// What admission decided for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Denied,
    /// The store failed and the request was rejected
    Errored,
    /// The store failed and the request was admitted anyway
    FailedOpen,
}

/// Which cache strategy served a read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStrategy {
    /// Version-tagged search results
    Search,
    /// Direct-key user profiles
    Profile,
}

#[derive(Default)]
struct HitMiss {
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Core metrics collected by the server
pub struct Metrics {
    start_time: Instant,

    pub admissions_allowed: AtomicU64,
    pub admissions_denied: AtomicU64,
    pub admissions_errored: AtomicU64,
    pub admissions_failed_open: AtomicU64,

    /// Admission check latency buckets
    pub latency_under_1ms: AtomicU64,
    pub latency_under_10ms: AtomicU64,
    pub latency_under_100ms: AtomicU64,
    pub latency_under_1s: AtomicU64,
    pub latency_over_1s: AtomicU64,
    pub latency_sum_micros: AtomicU64,
    pub latency_count: AtomicU64,

    search_cache: HitMiss,
    profile_cache: HitMiss,

    pub invalidations_ok: AtomicU64,
    pub invalidations_failed: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            admissions_allowed: AtomicU64::new(0),
            admissions_denied: AtomicU64::new(0),
            admissions_errored: AtomicU64::new(0),
            admissions_failed_open: AtomicU64::new(0),
            latency_under_1ms: AtomicU64::new(0),
            latency_under_10ms: AtomicU64::new(0),
            latency_under_100ms: AtomicU64::new(0),
            latency_under_1s: AtomicU64::new(0),
            latency_over_1s: AtomicU64::new(0),
            latency_sum_micros: AtomicU64::new(0),
            latency_count: AtomicU64::new(0),
            search_cache: HitMiss::default(),
            profile_cache: HitMiss::default(),
            invalidations_ok: AtomicU64::new(0),
            invalidations_failed: AtomicU64::new(0),
        }
    }

    /// Record one admission decision and how long the check took
    pub fn record_admission(&self, outcome: Admission, latency: Duration) {
        let counter = match outcome {
            Admission::Allowed => &self.admissions_allowed,
            Admission::Denied => &self.admissions_denied,
            Admission::Errored => &self.admissions_errored,
            Admission::FailedOpen => &self.admissions_failed_open,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        let latency_us = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        let bucket = match latency_us {
            0..=999 => &self.latency_under_1ms,
            1_000..=9_999 => &self.latency_under_10ms,
            10_000..=99_999 => &self.latency_under_100ms,
            100_000..=999_999 => &self.latency_under_1s,
            _ => &self.latency_over_1s,
        };
        bucket.fetch_add(1, Ordering::Relaxed);

        self.latency_sum_micros
            .fetch_add(latency_us, Ordering::Relaxed);
        self.latency_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache(&self, strategy: CacheStrategy, hit: bool) {
        let hm = self.cache(strategy);
        if hit {
            hm.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            hm.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_invalidation(&self, ok: bool) {
        if ok {
            self.invalidations_ok.fetch_add(1, Ordering::Relaxed);
        } else {
            self.invalidations_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn cache_hits(&self, strategy: CacheStrategy) -> u64 {
        self.cache(strategy).hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self, strategy: CacheStrategy) -> u64 {
        self.cache(strategy).misses.load(Ordering::Relaxed)
    }

    fn cache(&self, strategy: CacheStrategy) -> &HitMiss {
        match strategy {
            CacheStrategy::Search => &self.search_cache,
            CacheStrategy::Profile => &self.profile_cache,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        let mut out = String::with_capacity(2048);

        // Writing to a String cannot fail
        let _ = writeln!(out, "# HELP jobboard_uptime_seconds Time since server start in seconds");
        let _ = writeln!(out, "# TYPE jobboard_uptime_seconds gauge");
        let _ = writeln!(out, "jobboard_uptime_seconds {}\n", self.uptime_seconds());

        let _ = writeln!(out, "# HELP jobboard_admissions_total Admission decisions by outcome");
        let _ = writeln!(out, "# TYPE jobboard_admissions_total counter");
        for (outcome, counter) in [
            ("allowed", &self.admissions_allowed),
            ("denied", &self.admissions_denied),
            ("errored", &self.admissions_errored),
            ("failed_open", &self.admissions_failed_open),
        ] {
            let _ = writeln!(
                out,
                "jobboard_admissions_total{{outcome=\"{outcome}\"}} {}",
                load(counter)
            );
        }
        out.push('\n');

        let _ = writeln!(out, "# HELP jobboard_admission_duration_seconds Rate limit check latency");
        let _ = writeln!(out, "# TYPE jobboard_admission_duration_seconds histogram");
        let mut cumulative = 0;
        for (le, counter) in [
            ("0.001", &self.latency_under_1ms),
            ("0.01", &self.latency_under_10ms),
            ("0.1", &self.latency_under_100ms),
            ("1", &self.latency_under_1s),
            ("+Inf", &self.latency_over_1s),
        ] {
            cumulative += load(counter);
            let _ = writeln!(
                out,
                "jobboard_admission_duration_seconds_bucket{{le=\"{le}\"}} {cumulative}"
            );
        }
        let sum_seconds = load(&self.latency_sum_micros) as f64 / 1_000_000.0;
        let _ = writeln!(out, "jobboard_admission_duration_seconds_sum {sum_seconds:.6}");
        let _ = writeln!(
            out,
            "jobboard_admission_duration_seconds_count {}\n",
            load(&self.latency_count)
        );

        let _ = writeln!(out, "# HELP jobboard_cache_reads_total Cache reads by strategy and result");
        let _ = writeln!(out, "# TYPE jobboard_cache_reads_total counter");
        for (strategy, hm) in [("search", &self.search_cache), ("profile", &self.profile_cache)] {
            let _ = writeln!(
                out,
                "jobboard_cache_reads_total{{strategy=\"{strategy}\",result=\"hit\"}} {}",
                load(&hm.hits)
            );
            let _ = writeln!(
                out,
                "jobboard_cache_reads_total{{strategy=\"{strategy}\",result=\"miss\"}} {}",
                load(&hm.misses)
            );
        }
        out.push('\n');

        let _ = writeln!(out, "# HELP jobboard_invalidations_total Cache invalidations by result");
        let _ = writeln!(out, "# TYPE jobboard_invalidations_total counter");
        let _ = writeln!(
            out,
            "jobboard_invalidations_total{{result=\"ok\"}} {}",
            load(&self.invalidations_ok)
        );
        let _ = writeln!(
            out,
            "jobboard_invalidations_total{{result=\"failed\"}} {}",
            load(&self.invalidations_failed)
        );

        out
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
