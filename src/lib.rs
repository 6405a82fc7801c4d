//! A buffered client for sending metrics to a [statsd]-compatible server.
//!
//! [statsd]: https://github.com/statsd/statsd
//!
//! # Usage
//!
//! Connect once, record from anywhere, flush before shutdown:
//!
//! ```no_run
//! use statsd_client::{StatsReporter as _, StatsdClient};
//!
//! // The URL path, if present, becomes the bucket-name prefix: every metric
//! // below is reported under `my.app.`.
//! let client = StatsdClient::from_url("statsd://127.0.0.1:8125/my.app")
//!     .expect("failed to connect");
//!
//! client.count("requests", 1.0, 1.0);
//! client.count("requests.sampled", 1.0, 0.1);
//! client.gauge("queue.depth", 42.0);
//! client.timing("db.query", 12);
//! client.count_unique("visitors", "user-6116");
//!
//! // Nothing is flushed from a destructor; flush explicitly when done.
//! client.flush().expect("failed to flush");
//! ```
//!
//! Instrumentation is meant to be safe to sprinkle through code that must not
//! fail because a metrics server is down. When ignoring connectivity problems
//! is the right call, build against the no-op fallback:
//!
//! ```
//! use statsd_client::{from_url_or_nop, StatsReporter};
//!
//! let (stats, err) = from_url_or_nop("statsd://");
//! assert!(err.is_some());
//!
//! // Every operation on the fallback is a silent no-op.
//! stats.count("requests", 1.0, 1.0);
//! assert!(stats.flush().is_ok());
//! ```
//!
//! # Batching
//!
//! Statsd lines are newline-delimited, so multiple records can share a single
//! datagram and be split apart trivially by the server. Records accumulate in
//! an internal buffer until appending another line would push the payload
//! past the configured packet size (512 bytes by default); the buffer is then
//! flushed and the new record starts the next packet. A packet size of zero
//! disables batching entirely. Calling [`flush`](StatsReporter::flush)
//! transmits whatever is buffered.
//!
//! Delivery is fire-and-forget: transport errors empty the buffer without
//! retrying, since metrics are best-effort and retry would need unbounded
//! memory under a sustained outage.
//!
//! # Sampling
//!
//! Counters accept a sample rate in (0, 1]: the fraction of calls actually
//! put on the wire. The rate is carried in the line (`|@0.1`) so the server
//! can scale counts back up. Sampling randomness comes from the thread-local
//! generator by default and can be replaced through
//! [`StatsdBuilder::with_random_source`] for deterministic tests.
//!
//! # Threading
//!
//! [`StatsdClient`] is `Send + Sync` and cheap to clone; clones share one
//! buffer and one socket. Any number of threads may record through the same
//! client concurrently.

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::float_cmp)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![deny(missing_docs)]

mod buffer;

mod builder;
pub use self::builder::{BuildError, StatsdBuilder, DEFAULT_PACKET_SIZE};

mod client;
pub use self::client::{from_url_or_nop, NopReporter, StatsReporter, StatsdClient};

pub mod debugging;

mod format;

mod sample;
pub use self::sample::{RandomSource, ThreadRngSource};

mod sink;
pub use self::sink::{MetricSink, NopSink, UdpSink};
