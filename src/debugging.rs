//! Test doubles for instrumented code.
//!
//! [`CapturingReporter`] stands in for a real client in tests of code that
//! records metrics: it keeps the last value seen per bucket instead of
//! transmitting anything. [`CapturingSink`] plugs in below a real client and
//! retains every payload the client would have put on the wire.

use std::{collections::HashMap, io, sync::Arc};

use parking_lot::Mutex;

use crate::{client::StatsReporter, sink::MetricSink};

/// Everything a [`CapturingReporter`] has seen, keyed by bucket.
#[derive(Clone, Debug, Default)]
pub struct CapturedStats {
    /// Last counter delta per bucket.
    pub counts: HashMap<String, f64>,
    /// Last gauge value per bucket.
    pub gauges: HashMap<String, f64>,
    /// Last timing, in milliseconds, per bucket.
    pub timings: HashMap<String, u64>,
    /// Last set member per bucket, unsanitized.
    pub uniques: HashMap<String, String>,
}

/// A [`StatsReporter`] that records the last value per bucket instead of
/// transmitting.
///
/// Clones share state, so a test can hand one to the code under test and
/// inspect the same recorder afterwards.
#[derive(Clone, Default)]
pub struct CapturingReporter {
    state: Arc<Mutex<CapturedStats>>,
}

impl CapturingReporter {
    /// Creates an empty reporter.
    pub fn new() -> CapturingReporter {
        CapturingReporter::default()
    }

    /// Returns a snapshot of everything recorded so far.
    pub fn snapshot(&self) -> CapturedStats {
        self.state.lock().clone()
    }
}

impl StatsReporter for CapturingReporter {
    fn count(&self, bucket: &str, delta: f64, _sample_rate: f64) {
        self.state.lock().counts.insert(bucket.to_string(), delta);
    }

    fn gauge(&self, bucket: &str, value: f64) {
        self.state.lock().gauges.insert(bucket.to_string(), value);
    }

    fn timing(&self, bucket: &str, millis: u64) {
        self.state.lock().timings.insert(bucket.to_string(), millis);
    }

    fn count_unique(&self, bucket: &str, value: &str) {
        self.state.lock().uniques.insert(bucket.to_string(), value.to_string());
    }

    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

/// A [`MetricSink`] that retains every payload it is asked to send.
#[derive(Clone, Default)]
pub struct CapturingSink {
    payloads: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl CapturingSink {
    /// Creates an empty sink.
    pub fn new() -> CapturingSink {
        CapturingSink::default()
    }

    /// Returns every payload sent so far, in order.
    pub fn payloads(&self) -> Vec<String> {
        self.payloads.lock().iter().map(|p| String::from_utf8_lossy(p).into_owned()).collect()
    }
}

impl MetricSink for CapturingSink {
    fn emit(&self, payload: &[u8]) -> io::Result<usize> {
        self.payloads.lock().push(payload.to_vec());
        Ok(payload.len())
    }
}
