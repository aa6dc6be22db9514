#![warn(
    absolute_paths_not_starting_with_crate,
    elided_lifetimes_in_paths,
    explicit_outlives_requirements,
    trivial_casts,
    trivial_numeric_casts,
    unconditional_recursion,
    unreachable_patterns,
    unreachable_pub,
    unused_import_braces,
    unused_lifetimes,
    unused_must_use,
    unused_qualifications,
    variant_size_differences
)]

//! Packs named files into a single archive and restores them again.
//!
//! An archive is a header (entry count, then a null-terminated name and a 32-bit size for each
//! entry) followed by the raw contents of every entry in header order. See [`archive`] for the
//! exact layout.

#[macro_use]
pub mod macros;

pub mod archive;
pub mod common;


pub use archive::{
    create, create_with, extract, extract_with, ArchiveBuilder, ArchiveHeader, ArchiveReader,
    Error, HeaderEntry, Options, Result,
};
