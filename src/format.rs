//! Rendering of single metric observations into statsd wire lines.

/// Statsd metric types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MetricKind {
    Counter,
    Gauge,
    Timing,
    Set,
}

impl MetricKind {
    /// Returns the wire tag for the metric type.
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "c",
            MetricKind::Gauge => "g",
            MetricKind::Timing => "ms",
            MetricKind::Set => "s",
        }
    }
}

/// A single observation's payload value.
#[derive(Clone, Copy, Debug)]
pub(crate) enum MetricValue<'a> {
    Float(f64),
    Unsigned(u64),
    Text(&'a str),
}

/// Renders one wire line: `<prefix><bucket>:<value>|<kind>[|@<rate>]`.
///
/// The prefix is written verbatim ahead of the bucket name; it must already be
/// empty or end with the bucket separator. The `|@<rate>` suffix is only
/// present when the sample rate is not 1.
pub(crate) fn format_line(
    prefix: &str,
    bucket: &str,
    value: MetricValue<'_>,
    kind: MetricKind,
    sample_rate: f64,
) -> String {
    let mut line = String::with_capacity(prefix.len() + bucket.len() + 24);
    line.push_str(prefix);
    line.push_str(bucket);
    line.push(':');
    write_value(&mut line, value);
    line.push('|');
    line.push_str(kind.as_str());
    if sample_rate != 1.0 {
        line.push_str("|@");
        line.push_str(&sample_rate.to_string());
    }
    line
}

fn write_value(line: &mut String, value: MetricValue<'_>) {
    match value {
        // `Display` for f64 is the shortest decimal text that round-trips the
        // exact value, in fixed notation: 0.000000000000001 and
        // 1234567000000000000 render without an exponent, and integral values
        // render without a trailing ".0".
        MetricValue::Float(v) => line.push_str(&v.to_string()),
        MetricValue::Unsigned(v) => {
            let mut buf = itoa::Buffer::new();
            line.push_str(buf.format(v));
        }
        MetricValue::Text(v) => line.push_str(v),
    }
}

/// Cleans a set-member value for the wire.
///
/// Every run of one or more characters outside `[A-Za-z0-9_]` collapses to a
/// single underscore, uniformly across the whole string. Idempotent.
pub(crate) fn sanitize_set_value(value: &str) -> String {
    let mut clean = String::with_capacity(value.len());
    let mut in_run = false;
    for c in value.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            clean.push(c);
            in_run = false;
        } else if !in_run {
            clean.push('_');
            in_run = true;
        }
    }
    clean
}
