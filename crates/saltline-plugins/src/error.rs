//! Descriptor validation failures.

use std::io;

use saltline_wire::VersionError;
use thiserror::Error;

/// Why a plugin descriptor could not be built from its properties.
///
/// The `name` property is checked before anything else, so every later
/// failure can say which plugin it belongs to. None of these are
/// recoverable: a descriptor either validates completely or does not exist.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("property [name] is missing in plugin descriptor")]
    MissingName,
    #[error("property [{property}] is missing for plugin [{plugin}]")]
    MissingProperty {
        property: &'static str,
        plugin: String,
    },
    #[error("property [saltline.version] is malformed for plugin [{plugin}]: {source}")]
    InvalidEngineVersion {
        plugin: String,
        value: String,
        #[source]
        source: VersionError,
    },
    #[error(
        "property [runtime.version] must be a dot-separated sequence of decimal integers \
         for plugin [{plugin}] but was [{value}]"
    )]
    InvalidRuntimeVersion { plugin: String, value: String },
    #[error(
        "property [has.native.controller] must be [true], [false], or unspecified \
         for plugin [{plugin}] but was [{value}]"
    )]
    InvalidNativeController { plugin: String, value: String },
    #[error("unknown properties in plugin descriptor for plugin [{plugin}]: {properties:?}")]
    UnknownProperties {
        plugin: String,
        properties: Vec<String>,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}
