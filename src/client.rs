use std::{io, sync::Arc, time::Duration};

use parking_lot::Mutex;
use tracing::error;

use crate::{
    buffer::PacketBuffer,
    builder::{BuildError, StatsdBuilder},
    format::{self, MetricKind, MetricValue},
    sample::Sampler,
    sink::MetricSink,
};

/// Operations shared by every stats reporter.
///
/// All methods are safe to call from any number of threads. Recording calls
/// never fail: observations lost to sampling, buffer policy, or transport
/// failure are dropped silently, so instrumentation can be sprinkled through
/// application code without error handling at every call site.
pub trait StatsReporter {
    /// Increments (or decrements) a counter. The server resets counters to
    /// zero after each of its own reporting intervals.
    ///
    /// A sample rate of 1 records every call; a rate in (0, 1) records that
    /// fraction of calls, and the server scales reported counts by the
    /// inverse. Rates of zero or less record nothing.
    fn count(&self, bucket: &str, delta: f64, sample_rate: f64);

    /// Sets an arbitrary value. The server retains the last value received
    /// until it is overwritten.
    fn gauge(&self, bucket: &str, value: f64);

    /// Records a time interval in milliseconds. Percentiles, means, and
    /// bounds are calculated by the server.
    fn timing(&self, bucket: &str, millis: u64);

    /// Same as [`timing`](StatsReporter::timing), truncating the duration to
    /// whole milliseconds.
    fn timing_duration(&self, bucket: &str, duration: Duration) {
        self.timing(bucket, duration.as_millis() as u64);
    }

    /// Records one member of a set. The server counts the distinct values
    /// received per interval. Values are cleaned for the wire: every run of
    /// characters outside `[A-Za-z0-9_]` collapses to a single underscore.
    fn count_unique(&self, bucket: &str, value: &str);

    /// Sends whatever is buffered, if anything.
    ///
    /// Callers are responsible for a final flush before shutdown; nothing is
    /// flushed from a destructor.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the write fails. The buffer is emptied
    /// either way; metrics are best-effort and are not retried.
    fn flush(&self) -> io::Result<()>;
}

struct Inner {
    prefix: String,
    sampler: Sampler,
    buffer: Mutex<PacketBuffer>,
    sink: Box<dyn MetricSink + Send + Sync>,
}

/// A buffered statsd client.
///
/// Records are formatted into wire lines, batched into packet-sized payloads,
/// and handed to the sink either on overflow or on an explicit
/// [`flush`](StatsReporter::flush). Clones share the same buffer and
/// connection, so a client can be cloned per thread or shared directly.
#[derive(Clone)]
pub struct StatsdClient {
    inner: Arc<Inner>,
}

impl StatsdClient {
    /// Connects to the statsd server named by `url`, with default settings.
    ///
    /// The URL may be a bare `host:port` or carry a scheme and path, e.g.
    /// `statsd://stats.example.com:8125/my.app`; the path component becomes
    /// the bucket-name prefix. See [`StatsdBuilder`] for the full set of
    /// options.
    ///
    /// # Errors
    ///
    /// Returns a [`BuildError`] if the URL is malformed or the remote address
    /// cannot be resolved or connected.
    pub fn from_url(url: &str) -> Result<StatsdClient, BuildError> {
        StatsdBuilder::new().with_remote_address(url)?.build()
    }

    /// Returns a builder for configuring a client.
    pub fn builder() -> StatsdBuilder {
        StatsdBuilder::new()
    }

    pub(crate) fn from_parts(
        prefix: String,
        packet_size: usize,
        sampler: Sampler,
        sink: Box<dyn MetricSink + Send + Sync>,
    ) -> StatsdClient {
        StatsdClient {
            inner: Arc::new(Inner {
                prefix,
                sampler,
                buffer: Mutex::new(PacketBuffer::new(packet_size)),
                sink,
            }),
        }
    }

    fn record(&self, sample_rate: f64, bucket: &str, value: MetricValue<'_>, kind: MetricKind) {
        if !self.inner.sampler.should_emit(sample_rate) {
            return;
        }

        let line = format::format_line(&self.inner.prefix, bucket, value, kind, sample_rate);

        // The whole measure / maybe-flush / append sequence runs under the
        // buffer lock: two threads must not both decide the buffer still has
        // room and together push it past the packet budget.
        let mut buffer = self.inner.buffer.lock();
        if buffer.is_unbuffered() {
            buffer.push(&line);
            self.flush_locked(&mut buffer);
        } else {
            if !buffer.fits(line.len()) {
                self.flush_locked(&mut buffer);
            }
            buffer.push(&line);
        }
    }

    fn flush_locked(&self, buffer: &mut PacketBuffer) {
        if let Err(e) = flush_buffer(&self.inner, buffer) {
            error!(error = %e, "failed to send metrics payload");
        }
    }
}

fn flush_buffer(inner: &Inner, buffer: &mut PacketBuffer) -> io::Result<()> {
    if buffer.is_empty() {
        return Ok(());
    }

    // The payload is swapped out before the write, so the buffer is empty
    // again whether or not the send succeeds.
    let payload = buffer.take();
    inner.sink.emit(&payload)?;
    Ok(())
}

impl StatsReporter for StatsdClient {
    fn count(&self, bucket: &str, delta: f64, sample_rate: f64) {
        self.record(sample_rate, bucket, MetricValue::Float(delta), MetricKind::Counter);
    }

    fn gauge(&self, bucket: &str, value: f64) {
        self.record(1.0, bucket, MetricValue::Float(value), MetricKind::Gauge);
    }

    fn timing(&self, bucket: &str, millis: u64) {
        self.record(1.0, bucket, MetricValue::Unsigned(millis), MetricKind::Timing);
    }

    fn count_unique(&self, bucket: &str, value: &str) {
        let clean = format::sanitize_set_value(value);
        self.record(1.0, bucket, MetricValue::Text(&clean), MetricKind::Set);
    }

    fn flush(&self) -> io::Result<()> {
        let mut buffer = self.inner.buffer.lock();
        flush_buffer(&self.inner, &mut buffer)
    }
}

/// A reporter that discards every observation.
///
/// The explicit null object of the [`StatsReporter`] interface: construction
/// helpers hand one out when the real client cannot be built, and it works
/// anywhere instrumentation should be compiled in but switched off.
#[derive(Clone, Copy, Debug, Default)]
pub struct NopReporter;

impl StatsReporter for NopReporter {
    fn count(&self, _bucket: &str, _delta: f64, _sample_rate: f64) {}

    fn gauge(&self, _bucket: &str, _value: f64) {}

    fn timing(&self, _bucket: &str, _millis: u64) {}

    fn count_unique(&self, _bucket: &str, _value: &str) {}

    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

/// Connects to the statsd server named by `url`, falling back to a
/// [`NopReporter`] on failure.
///
/// On any construction error the caller receives the error alongside a fully
/// functional no-op reporter, so code mixed with statsd calls can choose to
/// ignore connectivity failures and keep running.
pub fn from_url_or_nop(url: &str) -> (Box<dyn StatsReporter + Send + Sync>, Option<BuildError>) {
    match StatsdBuilder::new().with_remote_address(url) {
        Ok(builder) => builder.build_or_nop(),
        Err(e) => (Box::new(NopReporter), Some(e)),
    }
}
