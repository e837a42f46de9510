//! BER (Basic Encoding Rules) codec for SNMP.
//!
//! This module provides decoding and encoding of BER-encoded data as used in
//! SNMP. Parsing follows X.690 with the permissive behaviors common to
//! deployed agents (non-minimal integers and lengths accepted, indefinite
//! lengths rejected), and every read is bounds-checked so hostile captures
//! cannot cause an over-read.

mod decode;
mod encode;
mod length;
pub mod tag;

pub use decode::*;
pub use encode::*;
pub use length::*;
pub use tag::{Class, Identifier};
