//! Saltline Plugin Descriptors
//!
//! This crate provides the descriptor every Saltline plugin ships: the
//! model, strict validation of the `plugin-descriptor.properties` file, the
//! version-gated wire codec nodes use to exchange descriptors, and the
//! document and text renderings the cluster surfaces them with.
//!
//! # Overview
//!
//! A descriptor is built exactly once, from a validated property file or
//! from a wire stream, and is immutable afterwards. Validation drains the
//! property map key by key and rejects anything left over, so a descriptor
//! either validates completely or does not exist. On the wire, fields added
//! over the releases are gated on the stream's negotiated protocol version,
//! which keeps old and new nodes interoperable.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use saltline_plugins::PluginDescriptor;
//!
//! let props = HashMap::from([
//!     ("name".to_string(), "analysis-icu".to_string()),
//!     ("description".to_string(), "ICU analysis support".to_string()),
//!     ("version".to_string(), "1.4.0".to_string()),
//!     ("saltline.version".to_string(), "2.4.0".to_string()),
//!     ("runtime.version".to_string(), "17".to_string()),
//!     ("classname".to_string(), "org.example.icu.IcuPlugin".to_string()),
//! ]);
//!
//! let descriptor = PluginDescriptor::from_properties(props).unwrap();
//! assert_eq!(descriptor.name(), "analysis-icu");
//! assert_eq!(descriptor.saltline_version().to_string(), "2.4.0");
//! assert!(!descriptor.has_native_controller());
//! assert!(descriptor.extended_plugins().is_empty());
//! ```
//!
//! # Modules
//!
//! - [`descriptor`]: The descriptor model, validation, codec, and renderers
//! - [`error`]: Validation failure taxonomy
//! - [`properties`]: Reader for `key = value` descriptor files

pub mod descriptor;
pub mod error;
pub mod properties;

// Re-export commonly used types at the crate root
pub use descriptor::{
    PluginDescriptor, DESCRIPTOR_FILENAME, LEGACY_RUNTIME_VERSION, POLICY_FILENAME,
};
pub use error::DescriptorError;
pub use saltline_wire::Version;
