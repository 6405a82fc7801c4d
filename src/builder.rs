use std::{
    io,
    net::{SocketAddr, ToSocketAddrs as _},
    time::Duration,
};

use thiserror::Error;

use crate::{
    client::{NopReporter, StatsReporter, StatsdClient},
    sample::{RandomSource, Sampler, ThreadRngSource},
    sink::{MetricSink, UdpSink},
};

/// Default maximum packet size, in bytes.
///
/// Matches the 512-byte packets of the original etsy statsd server, safe for
/// any network that can carry UDP at all. Raise it when the path to the
/// server is known to tolerate larger datagrams.
pub const DEFAULT_PACKET_SIZE: usize = 512;

const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Errors that could occur while building a statsd client.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The statsd URL could not be parsed.
    #[error("invalid statsd URL: {reason}")]
    InvalidUrl {
        /// Details about the parsing failure.
        reason: String,
    },

    /// The remote host could not be resolved.
    #[error("failed to resolve {host}: {source}")]
    Resolve {
        /// The host that failed to resolve.
        host: String,
        /// The underlying resolver error.
        source: io::Error,
    },

    /// The outbound socket could not be created or connected.
    #[error("failed to connect: {source}")]
    Connect {
        /// The underlying socket error.
        source: io::Error,
    },
}

/// Builder for a [`StatsdClient`].
pub struct StatsdBuilder {
    addrs: Vec<SocketAddr>,
    prefix: String,
    packet_size: usize,
    write_timeout: Duration,
    random_source: Box<dyn RandomSource>,
}

impl StatsdBuilder {
    /// Creates a builder with default settings: `127.0.0.1:8125`, a 512-byte
    /// packet budget, no prefix, and a 1 second write timeout.
    pub fn new() -> StatsdBuilder {
        StatsdBuilder::default()
    }

    /// Sets the remote address to send metrics to.
    ///
    /// Accepts a bare `host:port`, or a URL in the form
    /// `<scheme>://<host>:<port>[/<prefix>]`. Any scheme is accepted and
    /// ignored; the path component, when present, supplies the bucket-name
    /// prefix (normalized the same way as [`with_prefix`](Self::with_prefix)).
    /// The host is resolved eagerly.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL has no host, or if the host cannot be
    /// resolved to any address.
    pub fn with_remote_address<A>(mut self, url: A) -> Result<StatsdBuilder, BuildError>
    where
        A: AsRef<str>,
    {
        let (host, prefix) = split_url(url.as_ref())?;
        let addrs: Vec<SocketAddr> = match host.to_socket_addrs() {
            Ok(addrs) => addrs.collect(),
            Err(source) => return Err(BuildError::Resolve { host, source }),
        };
        if addrs.is_empty() {
            return Err(BuildError::Resolve {
                host,
                source: io::Error::new(io::ErrorKind::NotFound, "no addresses returned"),
            });
        }

        self.addrs = addrs;
        if let Some(prefix) = prefix {
            self.prefix = prefix;
        }
        Ok(self)
    }

    /// Sets the prefix prepended to every bucket name.
    ///
    /// A non-empty prefix is normalized to end with the bucket separator, so
    /// `"dude"` and `"dude."` are equivalent; a leading `/` (from URL paths)
    /// is stripped. An empty prefix leaves bucket names untouched.
    #[must_use]
    pub fn with_prefix<S>(mut self, prefix: S) -> StatsdBuilder
    where
        S: AsRef<str>,
    {
        self.prefix = normalize_prefix(prefix.as_ref());
        self
    }

    /// Sets the maximum packet size, in bytes.
    ///
    /// Records are batched until appending another line would push the
    /// payload past this size. A size of zero disables batching: every record
    /// is transmitted immediately as its own datagram.
    ///
    /// Defaults to [`DEFAULT_PACKET_SIZE`].
    #[must_use]
    pub fn with_packet_size(mut self, packet_size: usize) -> StatsdBuilder {
        self.packet_size = packet_size;
        self
    }

    /// Sets the write timeout for the outbound socket.
    ///
    /// When the timeout is reached the payload being sent is dropped without
    /// retrying.
    ///
    /// Defaults to 1 second.
    #[must_use]
    pub fn with_write_timeout(mut self, timeout: Duration) -> StatsdBuilder {
        self.write_timeout = timeout;
        self
    }

    /// Replaces the randomness used for sampling decisions.
    ///
    /// The default is the thread-local generator; tests substitute a
    /// deterministic source to make sampling exact.
    #[must_use]
    pub fn with_random_source<R>(mut self, source: R) -> StatsdBuilder
    where
        R: RandomSource + 'static,
    {
        self.random_source = Box::new(source);
        self
    }

    /// Builds the client, connecting a UDP sink to the configured remote
    /// address.
    ///
    /// # Errors
    ///
    /// Returns an error if the outbound socket cannot be created or
    /// connected.
    pub fn build(self) -> Result<StatsdClient, BuildError> {
        let sink = UdpSink::connect(&self.addrs, self.write_timeout)
            .map_err(|source| BuildError::Connect { source })?;
        Ok(self.build_with_sink(sink))
    }

    /// Builds the client around a caller-provided sink.
    ///
    /// The configured remote address and write timeout are unused; everything
    /// else applies. This is the seam for in-process sinks, such as the
    /// capturing doubles in [`debugging`](crate::debugging).
    pub fn build_with_sink<S>(self, sink: S) -> StatsdClient
    where
        S: MetricSink + Send + Sync + 'static,
    {
        StatsdClient::from_parts(
            self.prefix,
            self.packet_size,
            Sampler::new(self.random_source),
            Box::new(sink),
        )
    }

    /// Builds the client, falling back to a [`NopReporter`] on failure.
    ///
    /// On error the caller receives the error alongside a fully functional
    /// no-op reporter, so instrumented code can keep running against an
    /// unreachable server.
    pub fn build_or_nop(self) -> (Box<dyn StatsReporter + Send + Sync>, Option<BuildError>) {
        match self.build() {
            Ok(client) => (Box::new(client), None),
            Err(e) => (Box::new(NopReporter), Some(e)),
        }
    }
}

impl Default for StatsdBuilder {
    fn default() -> StatsdBuilder {
        StatsdBuilder {
            addrs: vec![SocketAddr::from(([127, 0, 0, 1], 8125))],
            prefix: String::new(),
            packet_size: DEFAULT_PACKET_SIZE,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            random_source: Box::new(ThreadRngSource),
        }
    }
}

/// Splits a statsd URL into its host and optional prefix path.
fn split_url(url: &str) -> Result<(String, Option<String>), BuildError> {
    let rest = match url.split_once("://") {
        Some((_scheme, rest)) => rest,
        None => url,
    };

    let (host, prefix) = match rest.split_once('/') {
        Some((host, path)) => (host, Some(normalize_prefix(path))),
        None => (rest, None),
    };

    if host.is_empty() {
        return Err(BuildError::InvalidUrl { reason: format!("{url:?} is missing a host") });
    }

    Ok((host.to_string(), prefix))
}

fn normalize_prefix(prefix: &str) -> String {
    let prefix = prefix.trim_start_matches('/');
    if prefix.is_empty() || prefix.ends_with('.') {
        prefix.to_string()
    } else {
        format!("{prefix}.")
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_prefix, split_url, BuildError};

    #[test]
    fn split_url_accepts_bare_host_port() {
        let (host, prefix) = split_url("localhost:8125").unwrap();
        assert_eq!(host, "localhost:8125");
        assert_eq!(prefix, None);
    }

    #[test]
    fn split_url_strips_the_scheme() {
        let (host, prefix) = split_url("statsd://localhost:8125").unwrap();
        assert_eq!(host, "localhost:8125");
        assert_eq!(prefix, None);
    }

    #[test]
    fn split_url_takes_the_prefix_from_the_path() {
        let (host, prefix) = split_url("statsd://localhost:8125/my.app").unwrap();
        assert_eq!(host, "localhost:8125");
        assert_eq!(prefix.as_deref(), Some("my.app."));
    }

    #[test]
    fn split_url_with_empty_path_clears_the_prefix() {
        let (_, prefix) = split_url("statsd://localhost:8125/").unwrap();
        assert_eq!(prefix.as_deref(), Some(""));
    }

    #[test]
    fn split_url_rejects_a_missing_host() {
        assert!(matches!(split_url("statsd://"), Err(BuildError::InvalidUrl { .. })));
        assert!(matches!(split_url(""), Err(BuildError::InvalidUrl { .. })));
        assert!(matches!(split_url("statsd:///my.app"), Err(BuildError::InvalidUrl { .. })));
    }

    #[test]
    fn prefixes_gain_a_trailing_separator() {
        assert_eq!(normalize_prefix("dude"), "dude.");
        assert_eq!(normalize_prefix("dude."), "dude.");
        assert_eq!(normalize_prefix("/dude"), "dude.");
        assert_eq!(normalize_prefix(""), "");
    }
}
