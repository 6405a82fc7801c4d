use bytes::BytesMut;

/// Accumulates formatted metric lines into packet-sized payloads.
///
/// Lines are newline-joined in insertion order. The buffer never grows past
/// the configured maximum packet size, with one exception: a single line
/// larger than the whole budget is still accepted into an empty buffer, so
/// that oversized records are sent alone rather than dropped or split.
///
/// A maximum packet size of zero disables batching entirely; callers flush
/// after every append.
pub(crate) struct PacketBuffer {
    max_packet_size: usize,
    buf: BytesMut,
}

impl PacketBuffer {
    pub(crate) fn new(max_packet_size: usize) -> Self {
        let capacity = if max_packet_size == 0 { 256 } else { max_packet_size };
        PacketBuffer { max_packet_size, buf: BytesMut::with_capacity(capacity) }
    }

    pub(crate) fn is_unbuffered(&self) -> bool {
        self.max_packet_size == 0
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Returns `true` if `line` can be appended without pushing the payload
    /// past the maximum packet size, counting the newline joiner.
    ///
    /// An empty buffer accepts any line, however large.
    pub(crate) fn fits(&self, line_len: usize) -> bool {
        self.buf.is_empty() || self.buf.len() + 1 + line_len <= self.max_packet_size
    }

    pub(crate) fn push(&mut self, line: &str) {
        if !self.buf.is_empty() {
            self.buf.extend_from_slice(b"\n");
        }
        self.buf.extend_from_slice(line.as_bytes());
    }

    /// Hands off the accumulated payload, leaving the buffer empty.
    pub(crate) fn take(&mut self) -> BytesMut {
        self.buf.split()
    }
}

#[cfg(test)]
mod tests {
    use super::PacketBuffer;

    #[test]
    fn joins_lines_in_order() {
        let mut buffer = PacketBuffer::new(512);
        buffer.push("a:1|c");
        buffer.push("b:2|c");
        buffer.push("c:3|c");
        assert_eq!(&buffer.take()[..], b"a:1|c\nb:2|c\nc:3|c");
        assert!(buffer.is_empty());
    }

    #[test]
    fn fits_counts_the_joiner() {
        let mut buffer = PacketBuffer::new(11);
        buffer.push("a:1|c");
        // 5 + 1 + 5 == 11, exactly at the limit.
        assert!(buffer.fits(5));
        // 5 + 1 + 6 == 12, one past it.
        assert!(!buffer.fits(6));
    }

    #[test]
    fn empty_buffer_accepts_oversized_lines() {
        let mut buffer = PacketBuffer::new(8);
        assert!(buffer.fits(100));
        buffer.push("four.score.and.seven:1|c");
        assert!(!buffer.fits(1));
        assert_eq!(&buffer.take()[..], b"four.score.and.seven:1|c");
    }

    #[test]
    fn zero_size_means_unbuffered() {
        let buffer = PacketBuffer::new(0);
        assert!(buffer.is_unbuffered());
        assert!(!PacketBuffer::new(512).is_unbuffered());
    }

    #[test]
    fn take_resets_for_reuse() {
        let mut buffer = PacketBuffer::new(512);
        buffer.push("a:1|c");
        let _ = buffer.take();
        buffer.push("b:2|c");
        assert_eq!(&buffer.take()[..], b"b:2|c");
    }
}
