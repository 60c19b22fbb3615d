//! STK500v2-style in-system-programming protocol: frame parsing,
//! command dispatch against a caller-supplied [`Programmer`], and the
//! watchdog handoff back to the application on `LEAVE_PROGMODE_ISP`.

#![no_std]

pub mod command;
pub mod dispatch;
pub mod frame;
pub mod handoff;
pub mod programmer;

pub use command::Command;
pub use dispatch::Dispatcher;
pub use frame::{FeedResult, Parser, FRAME_OVERHEAD, MAX_BODY};
pub use handoff::HandoffSink;
pub use programmer::{Fuse, Programmer};

/// Ties the frame parser and command dispatcher together: feed it
/// incoming bytes one at a time, and whenever a full frame completes it
/// hands back the framed reply to send and whether the session should
/// hand off to the application.
pub struct BootProtocol<P: Programmer> {
    parser: Parser,
    dispatcher: Dispatcher<P>,
}

impl<P: Programmer> BootProtocol<P> {
    pub fn new(programmer: P) -> Self {
        BootProtocol { parser: Parser::new(), dispatcher: Dispatcher::new(programmer) }
    }

    /// Feeds one byte. On a complete, valid frame, writes the framed
    /// reply into `out` (which must be at least
    /// `MAX_BODY + FRAME_OVERHEAD` bytes) and returns its length plus
    /// whether `LEAVE_PROGMODE_ISP` was just processed.
    pub fn feed(&mut self, byte: u8, out: &mut [u8]) -> Option<(usize, bool)> {
        match self.parser.feed(byte) {
            FeedResult::Ready => {
                let seq = self.parser.seq();
                let mut reply_body = [0u8; MAX_BODY];
                let (reply_len, leave) = self.dispatcher.process(self.parser.body(), &mut reply_body);
                let framed_len = frame::encode(seq, &reply_body[..reply_len], out);
                Some((framed_len, leave))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::programmer::Fuse;

    struct StubProgrammer;
    impl Programmer for StubProgrammer {
        fn signature(&self) -> [u8; 3] {
            [0x1E, 0x95, 0x0F]
        }
        fn read_fuse(&mut self, _which: Fuse) -> u8 {
            0xFF
        }
        fn read_lock(&mut self) -> u8 {
            0xFF
        }
        fn chip_erase(&mut self) {}
        fn program_flash_page(&mut self, _byte_offset: u32, _data: &[u8]) {}
        fn read_flash(&mut self, _byte_offset: u32, out: &mut [u8]) {
            out.fill(0);
        }
        fn program_eeprom_byte(&mut self, _byte_offset: u32, _value: u8) {}
        fn read_eeprom_byte(&mut self, _byte_offset: u32) -> u8 {
            0
        }
        fn battery_millivolts(&mut self) -> u16 {
            3300
        }
    }

    #[test]
    fn full_sign_on_round_trip_through_the_wire_protocol() {
        let mut proto = BootProtocol::new(StubProgrammer);
        let mut request = [0u8; MAX_BODY + FRAME_OVERHEAD];
        let req_len = frame::encode(1, &[0x01], &mut request);

        let mut reply = [0u8; MAX_BODY + FRAME_OVERHEAD];
        let mut result = None;
        for &b in &request[..req_len] {
            if let Some(r) = proto.feed(b, &mut reply) {
                result = Some(r);
            }
        }
        let (len, leave) = result.expect("frame should complete");
        assert!(!leave);
        assert_eq!(reply[1], 1); // echoed seq
        assert_eq!(reply[5], 0x01); // echoed command byte
        assert_eq!(&reply[6..16], b"\x00\x08AVRISP_2");
        assert_eq!(len, 17);
    }
}
