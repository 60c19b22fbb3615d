//! The single sum-typed error the rest of this crate returns, folding
//! every layer's polymorphic boolean/numeric error returns into one
//! kind a caller can branch on, per the source's mix of error styles.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Low-level SD initialisation failed.
    CardUnavailable,
    /// The card is not SDHC/SDXC v2 with a 512-byte block size.
    CardUnsupported,
    /// uFAT signature or metadata checksum mismatch; the volume must be
    /// reformatted.
    FsUnavailable,
    /// A write would exceed a log's pre-allocated extent.
    LogFull,
    /// The SD card did not return to ready within the write timeout.
    WriteTimeout,
    /// The card's data-response token rejected a written block.
    WriteRejected,
    /// A bootloader frame's start byte, token or checksum did not
    /// validate.
    FrameError,
    /// A framed I/O write could not be accepted atomically.
    BufferFull,
    /// A bootloader command was unknown, or the remote transport it
    /// rides on failed outright.
    ProtocolError,
}

impl From<sd::Error> for Error {
    fn from(e: sd::Error) -> Self {
        match e {
            sd::Error::CardUnavailable => Error::CardUnavailable,
            sd::Error::CardUnsupported => Error::CardUnsupported,
            sd::Error::WriteTimeout => Error::WriteTimeout,
            sd::Error::WriteRejected => Error::WriteRejected,
        }
    }
}

impl From<ufat::Error> for Error {
    fn from(e: ufat::Error) -> Self {
        match e {
            ufat::Error::Device => Error::CardUnavailable,
            ufat::Error::FsUnavailable => Error::FsUnavailable,
            ufat::Error::LogFull => Error::LogFull,
            ufat::Error::InvalidLogIndex => Error::ProtocolError,
        }
    }
}

impl From<framed_io::Error> for Error {
    fn from(e: framed_io::Error) -> Self {
        match e {
            framed_io::Error::BufferFull => Error::BufferFull,
            framed_io::Error::Remote => Error::ProtocolError,
        }
    }
}

/// Maps a bootloader frame parse outcome onto this crate's error kind.
/// `Pending`/`Ready` are not errors, so this only ever narrows
/// [`bootproto::FeedResult`] down to the bad-frame case spec.md calls
/// out: any checksum/start/token mismatch resets the parser to START
/// without touching the sequence counter, and is surfaced here as
/// `FrameError` for anything that wants to count or log it.
pub fn frame_error(result: bootproto::FeedResult) -> Option<Error> {
    use bootproto::FeedResult;
    match result {
        FeedResult::Pending | FeedResult::Ready => None,
        FeedResult::BadStart | FeedResult::BadToken | FeedResult::BadChecksum | FeedResult::BodyTooLarge => {
            Some(Error::FrameError)
        }
    }
}
