//! Non-blocking half-duplex framed I/O channel.
//!
//! Multiplexes a TX ring and an RX ring onto a remote endpoint that only
//! exposes three query-style operations — write N bytes, query the
//! receive level, read N bytes — the shape of an I²C bridge or a
//! Bluetooth UART accessed through a command/response sideband rather
//! than a true duplex wire. A periodic [`Channel::tick`] call (meant to
//! run at 1 kHz) drives the interleaving: `K` transmit turns for every
//! inquire, then a drain of whatever the remote reports buffered for us.

#![no_std]

use ringbuf::RingBuffer;

/// Bytes moved in a single write/read transaction.
pub const MAX_PAYLOAD: usize = 32;

/// Default writes-before-inquire count.
pub const DEFAULT_K: u8 = 4;

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// `put_buffer` could not accept the whole buffer atomically.
    BufferFull,
    /// The remote endpoint rejected or failed a transaction.
    Remote,
}

/// The query-based transport the channel multiplexes onto. Implemented by
/// whatever actually owns the I²C bus or Bluetooth UART.
pub trait RemoteEndpoint {
    /// Writes `data`, returning the number of bytes actually accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize, ()>;
    /// Returns how many bytes the remote has buffered for us to read.
    fn query_level(&mut self) -> Result<usize, ()>;
    /// Reads up to `buf.len()` bytes into `buf`, returning the count read.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ()>;
}

/// Intercepts bytes as they arrive from the remote, before they reach the
/// RX ring. Returning `false` drops the byte.
pub trait RxFilter {
    fn accept(&mut self, byte: u8) -> bool;
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum State {
    Tx(u8),
    Inquire,
    Read,
}

/// The channel's TX/RX rings and the TX-then-inquire interleaving state.
pub struct Channel<const TXCAP: usize, const RXCAP: usize> {
    tx: RingBuffer<TXCAP>,
    rx: RingBuffer<RXCAP>,
    state: State,
    k: u8,
    pending_k: Option<u8>,
    remote_level: usize,
}

impl<const TXCAP: usize, const RXCAP: usize> Channel<TXCAP, RXCAP> {
    pub const fn new() -> Self {
        Channel {
            tx: RingBuffer::new(),
            rx: RingBuffer::new(),
            state: State::Tx(0),
            k: DEFAULT_K,
            pending_k: None,
            remote_level: 0,
        }
    }

    /// Changes the number of TX turns between inquiries. Applied lazily,
    /// at the start of the next TX-0 cycle, never mid-cycle.
    pub fn set_writes_before_inquire(&mut self, k: u8) {
        assert!(k >= 1 && k <= 128);
        self.pending_k = Some(k);
    }

    /// Queues `data` for transmission. Succeeds fully or fails fully, so
    /// frame boundaries placed by the caller are never split.
    pub fn put_buffer(&mut self, data: &[u8]) -> Result<(), Error> {
        if self.tx.free() < data.len() {
            return Err(Error::BufferFull);
        }
        for &b in data {
            self.tx.push(b);
        }
        Ok(())
    }

    /// Returns the next byte the remote has sent us, if any.
    pub fn get_char(&mut self) -> Option<u8> {
        self.rx.pop()
    }

    pub fn tx_free(&self) -> usize {
        self.tx.free()
    }

    pub fn rx_level(&self) -> usize {
        self.rx.level()
    }

    /// Runs one step of the state machine against `remote`, optionally
    /// filtering newly-received bytes through `filter`.
    pub fn tick<R: RemoteEndpoint>(
        &mut self,
        remote: &mut R,
        mut filter: Option<&mut dyn RxFilter>,
    ) -> Result<(), Error> {
        match self.state {
            State::Tx(i) => {
                if i == 0 {
                    if let Some(k) = self.pending_k.take() {
                        self.k = k;
                    }
                }
                if self.tx.is_empty() {
                    self.state = State::Inquire;
                    return Ok(());
                }
                let mut chunk = [0u8; MAX_PAYLOAD];
                let mut n = 0;
                while n < MAX_PAYLOAD {
                    match self.tx.pop() {
                        Some(b) => {
                            chunk[n] = b;
                            n += 1;
                        }
                        None => break,
                    }
                }
                remote.write(&chunk[..n]).map_err(|_| Error::Remote)?;
                let next = i + 1;
                self.state = if next < self.k {
                    State::Tx(next)
                } else {
                    State::Inquire
                };
                Ok(())
            }
            State::Inquire => {
                if self.rx.free() == 0 {
                    self.state = State::Tx(0);
                    return Ok(());
                }
                self.remote_level = remote.query_level().map_err(|_| Error::Remote)?;
                self.state = State::Read;
                Ok(())
            }
            State::Read => {
                if self.remote_level == 0 || self.rx.free() == 0 {
                    self.state = State::Tx(0);
                    return Ok(());
                }
                let n = core::cmp::min(self.remote_level, core::cmp::min(self.rx.free(), MAX_PAYLOAD));
                let mut chunk = [0u8; MAX_PAYLOAD];
                let got = remote.read(&mut chunk[..n]).map_err(|_| Error::Remote)?;
                for &b in &chunk[..got] {
                    let keep = filter.as_deref_mut().map_or(true, |f| f.accept(b));
                    if keep {
                        self.rx.push(b);
                    }
                }
                self.remote_level = self.remote_level.saturating_sub(got);
                if self.remote_level == 0 {
                    self.state = State::Tx(0);
                }
                Ok(())
            }
        }
    }
}

impl<const TXCAP: usize, const RXCAP: usize> Default for Channel<TXCAP, RXCAP> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Loopback {
        inbox: RingBuffer<256>,
    }

    impl Loopback {
        fn new() -> Self {
            Loopback { inbox: RingBuffer::new() }
        }
        fn inject(&mut self, data: &[u8]) {
            for &b in data {
                self.inbox.push(b);
            }
        }
    }

    impl RemoteEndpoint for Loopback {
        fn write(&mut self, _data: &[u8]) -> Result<usize, ()> {
            Ok(_data.len())
        }
        fn query_level(&mut self) -> Result<usize, ()> {
            Ok(self.inbox.level())
        }
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
            let mut n = 0;
            while n < buf.len() {
                match self.inbox.pop() {
                    Some(b) => {
                        buf[n] = b;
                        n += 1;
                    }
                    None => break,
                }
            }
            Ok(n)
        }
    }

    #[test]
    fn put_buffer_rejects_when_not_enough_room() {
        let mut ch: Channel<4, 4> = Channel::new();
        assert_eq!(ch.put_buffer(&[1, 2, 3, 4, 5]), Err(Error::BufferFull));
        assert_eq!(ch.tx_free(), 3);
    }

    #[test]
    fn bytes_flow_from_remote_into_rx_ring() {
        let mut ch: Channel<16, 16> = Channel::new();
        let mut remote = Loopback::new();
        remote.inject(b"hi");
        // TX turns with nothing queued fall straight through to INQUIRE.
        for _ in 0..(DEFAULT_K as usize + 2) {
            ch.tick(&mut remote, None).unwrap();
        }
        assert_eq!(ch.get_char(), Some(b'h'));
        assert_eq!(ch.get_char(), Some(b'i'));
        assert_eq!(ch.get_char(), None);
    }

    #[test]
    fn rx_filter_can_drop_bytes() {
        struct DropZero;
        impl RxFilter for DropZero {
            fn accept(&mut self, byte: u8) -> bool {
                byte != 0
            }
        }
        let mut ch: Channel<16, 16> = Channel::new();
        let mut remote = Loopback::new();
        remote.inject(&[1, 0, 2]);
        for _ in 0..(DEFAULT_K as usize + 2) {
            ch.tick(&mut remote, Some(&mut DropZero)).unwrap();
        }
        assert_eq!(ch.get_char(), Some(1));
        assert_eq!(ch.get_char(), Some(2));
        assert_eq!(ch.get_char(), None);
    }
}
