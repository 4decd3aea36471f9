//! Saltline Wire Layer
//!
//! This crate provides the binary primitives Saltline nodes use to talk to
//! each other: release version tokens with a stable numeric id, and
//! stream wrappers that carry the protocol version the two peers negotiated.
//!
//! # Overview
//!
//! Saltline's wire format is append-only. A field added in release X is
//! written and read only when the negotiated stream version is at least X,
//! so old and new nodes interoperate without framing or tags. The
//! [`WireCodec`] trait is the seam a value implements to travel on such a
//! stream.
//!
//! # Example
//!
//! ```
//! use saltline_wire::{Version, WireCodec, WireReader, WireWriter};
//!
//! let negotiated = Version::V_2_3_0;
//!
//! let mut writer = WireWriter::new(Vec::new(), negotiated);
//! writer.write_string("analysis-icu").unwrap();
//! Version::CURRENT.write_to(&mut writer).unwrap();
//! let bytes = writer.into_inner();
//!
//! let mut reader = WireReader::new(bytes.as_slice(), negotiated);
//! assert_eq!(reader.read_string().unwrap(), "analysis-icu");
//! assert_eq!(Version::read_from(&mut reader).unwrap(), Version::CURRENT);
//! ```
//!
//! # Modules
//!
//! - [`error`]: Wire failure taxonomy
//! - [`stream`]: Version-negotiated readers, writers, and the codec trait
//! - [`version`]: Release versions, qualifiers, and numeric ids

pub mod error;
pub mod stream;
pub mod version;

// Re-export commonly used types at the crate root
pub use error::{WireError, WireResult};
pub use stream::{WireCodec, WireReader, WireWriter};
pub use version::{Qualifier, Version, VersionError};
