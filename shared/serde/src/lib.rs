//! # MeshSync Serde
//! Little-endian binary codec shared by the MeshSync server & client.
//!
//! Values are written as raw `size_of::<T>()` byte dumps with no padding.
//! Strings and sequences carry a `u32` length prefix.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

#[cfg(target_endian = "big")]
compile_error!("the MeshSync wire format dumps plain-old-data directly and requires a little-endian target");

mod byte_reader;
mod byte_writer;
mod checksum;
mod error;
mod serde;

pub use byte_reader::ByteReader;
pub use byte_writer::ByteWriter;
pub use checksum::{
    checksum_bytes, checksum_pod, checksum_str, hash_bytes, hash_combine, hash_pod,
};
pub use error::SerdeErr;
pub use serde::{ConstByteLength, Serde};
