use thiserror::Error;

/// The error type of the [`Mpls::parse`] family of methods.
///
/// [`Mpls::parse`]: ../types/struct.Mpls.html#method.parse
#[derive(Debug, Error)]
pub enum MplsError {
    /// An I/O error occurred while reading the input.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// The first four bytes are not `MPLS`.
    #[error("invalid signature {0:?}, expected \"MPLS\"")]
    InvalidSignature([u8; 4]),
    /// The version code is not a number.
    #[error("invalid version code {0:?}")]
    InvalidVersion([u8; 4]),
    /// A length or address points past the end of the data it refers into.
    #[error("read out of bounds at offset {offset:#x}")]
    OutOfBounds {
        /// Absolute file offset of the read that failed.
        offset: usize,
    },
}
