#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Low-level SD initialisation failed (no response, bad CRC, timeout
    /// before idle state was reached).
    CardUnavailable,
    /// The card is not SDHC/SDXC v2 with a 512-byte block size.
    CardUnsupported,
    /// A multi-block write did not return to ready within the timeout.
    WriteTimeout,
    /// The card's data-response token rejected a written block.
    WriteRejected,
}
