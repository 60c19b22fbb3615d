#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The underlying block device reported a failure.
    Device,
    /// MBR or boot-sector signature, FS type, or metadata checksum did
    /// not validate. The volume must be reformatted.
    FsUnavailable,
    /// A write would exceed the log's pre-allocated extent.
    LogFull,
    /// `log_open` was called with an index `>= log_count`.
    InvalidLogIndex,
}

impl From<sd::Error> for Error {
    fn from(_: sd::Error) -> Self {
        Error::Device
    }
}
