//! A typed decoder for Blu-ray movie playlist (MPLS) files.
//!
//! The entry point into this crate is the [`Mpls`] struct. You can obtain an
//! instance of that struct through its [`parse`], [`from`] or [`open`]
//! methods.
//!
//! A playlist is decoded in a single pass into an owned tree that mirrors the
//! on-disk layout: the application info, the play list with its play items
//! and sub paths (each play item carrying its stream number table), the
//! play list marks (chapters), and the optional extension data. Enumerated
//! fields are decoded into enums; values this crate doesn't know are kept as
//! `Unknown` variants rather than rejected.
//!
//! The MPLS file format is not officially documented, and this parser relies
//! heavily on the excellent third-party file specs in the [lw/BluRay]
//! repository as well as the [bdinfo/mpls] Wikibooks page. Refer to those for
//! more in-depth information.
//!
//! Decoding fails with an [`MplsError`] when the signature or version is
//! invalid, or when a length or address inside the file points past the data
//! it refers into. No partial playlist is returned in that case.
//!
//! [`Mpls`]: types/struct.Mpls.html
//! [`parse`]: types/struct.Mpls.html#method.parse
//! [`from`]: types/struct.Mpls.html#method.from
//! [`open`]: types/struct.Mpls.html#method.open
//! [`MplsError`]: enum.MplsError.html
//! [lw/BluRay]: https://github.com/lw/BluRay/wiki/MPLS
//! [bdinfo/mpls]: https://en.wikibooks.org/wiki/User:Bdinfo/mpls
//!
//! # Examples
//! ```no_run
//! # fn main() -> Result<(), bluray_mpls::MplsError> {
//! use bluray_mpls::Mpls;
//!
//! // parse the play list
//! let mpls = Mpls::open("00800.mpls")?;
//!
//! // list the chapters
//! for (i, mark) in mpls.marks.marks.iter().enumerate() {
//!     println!("chapter {}: {:.3}s", i + 1, mark.time_stamp.seconds());
//! }
//!
//! // extract the segments of each angle
//! for angle in mpls.angles() {
//!     let segments: Vec<&str> = angle
//!         .segments()
//!         .iter()
//!         .map(|s| s.file_name.as_str())
//!         .collect();
//!     println!("angle {}: {:?}", angle, segments);
//! }
//! # Ok(())
//! # }
//! ```
#![doc(html_root_url = "https://docs.rs/bluray-mpls/0.1.0")]

mod error;
mod parser;
pub mod types;

pub use error::MplsError;
pub use types::*;
