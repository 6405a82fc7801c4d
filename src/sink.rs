use std::{
    io,
    net::{Ipv4Addr, SocketAddr, UdpSocket},
    time::Duration,
};

use tracing::debug;

/// A destination for formatted metric payloads.
///
/// Implementations perform a single blocking write per payload, with no retry
/// and no partial-write recovery beyond what the transport primitive itself
/// guarantees. Failures are returned to the flush caller.
pub trait MetricSink {
    /// Sends one payload, returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns the underlying transport error, if any.
    fn emit(&self, payload: &[u8]) -> io::Result<usize>;
}

/// A sink that sends each payload as one UDP datagram to a fixed remote
/// address.
///
/// The socket is bound and connected once, at construction; it is never
/// re-created afterwards.
pub struct UdpSink {
    socket: UdpSocket,
}

impl UdpSink {
    /// Binds an ephemeral local socket and connects it to the first usable
    /// address in `addrs`, with the given write timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the local socket cannot be created, connected, or
    /// configured.
    pub fn connect(addrs: &[SocketAddr], write_timeout: Duration) -> io::Result<UdpSink> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        socket.connect(addrs)?;
        socket.set_write_timeout(Some(write_timeout))?;
        debug!(remote = ?socket.peer_addr().ok(), "connected statsd sink");
        Ok(UdpSink { socket })
    }
}

impl MetricSink for UdpSink {
    fn emit(&self, payload: &[u8]) -> io::Result<usize> {
        self.socket.send(payload)
    }
}

/// A sink that discards every payload.
#[derive(Clone, Copy, Debug, Default)]
pub struct NopSink;

impl MetricSink for NopSink {
    fn emit(&self, payload: &[u8]) -> io::Result<usize> {
        Ok(payload.len())
    }
}

#[cfg(test)]
mod tests {
    use std::{net::UdpSocket, time::Duration};

    use super::{MetricSink, NopSink, UdpSink};

    #[test]
    fn udp_sink_sends_one_datagram_per_emit() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let addr = receiver.local_addr().unwrap();

        let sink = UdpSink::connect(&[addr], Duration::from_secs(1)).unwrap();
        assert_eq!(sink.emit(b"a:1|c").unwrap(), 5);

        let mut buf = [0u8; 64];
        let (n, _) = receiver.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"a:1|c");
    }

    #[test]
    fn nop_sink_reports_full_writes() {
        assert_eq!(NopSink.emit(b"a:1|c").unwrap(), 5);
    }
}
