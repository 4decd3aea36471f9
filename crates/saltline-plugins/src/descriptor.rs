//! Plugin descriptors.
//!
//! Every plugin ships a `plugin-descriptor.properties` file describing what
//! it is and what it needs. Nodes also exchange descriptors on the wire so
//! the cluster can report which plugins each peer runs. A descriptor is an
//! immutable value: it is validated once when built and only read after.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::{Read, Write};
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use saltline_wire::{Version, WireCodec, WireReader, WireResult, WireWriter};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use tracing::debug;

use crate::error::DescriptorError;
use crate::properties;

/// File name of the descriptor every plugin directory must contain.
pub const DESCRIPTOR_FILENAME: &str = "plugin-descriptor.properties";

/// File name of the optional sandbox policy shipped next to the descriptor.
pub const POLICY_FILENAME: &str = "plugin-security.policy";

/// Runtime version reported for peers too old to send one on the wire.
pub const LEGACY_RUNTIME_VERSION: &str = "1.0";

/// Runtime versions are opaque but must look like a version: decimal
/// integer groups separated by dots, leading zeros allowed.
const RUNTIME_VERSION_PATTERN: &str = r"^[0-9]+(\.[0-9]+)*$";

static RUNTIME_VERSION_REGEX: OnceLock<Regex> = OnceLock::new();

fn runtime_version_regex() -> &'static Regex {
    RUNTIME_VERSION_REGEX
        .get_or_init(|| Regex::new(RUNTIME_VERSION_PATTERN).expect("invalid regex pattern"))
}

/// Metadata a plugin declares about itself.
///
/// Two descriptors are the same plugin installation exactly when `name` and
/// `version` match; every other field is advisory metadata and excluded
/// from equality and hashing on purpose.
#[derive(Debug, Clone)]
pub struct PluginDescriptor {
    name: String,
    description: String,
    version: String,
    saltline_version: Version,
    runtime_version: String,
    classname: String,
    extended_plugins: Vec<String>,
    has_native_controller: bool,
}

impl PluginDescriptor {
    /// Builds a descriptor from already-validated parts. The wire decode
    /// path uses this; file-based construction goes through
    /// [`PluginDescriptor::from_properties`], which is where validation
    /// lives.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        version: impl Into<String>,
        saltline_version: Version,
        runtime_version: impl Into<String>,
        classname: impl Into<String>,
        extended_plugins: Vec<String>,
        has_native_controller: bool,
    ) -> PluginDescriptor {
        PluginDescriptor {
            name: name.into(),
            description: description.into(),
            version: version.into(),
            saltline_version,
            runtime_version: runtime_version.into(),
            classname: classname.into(),
            extended_plugins,
            has_native_controller,
        }
    }

    /// Builds a descriptor by draining a property map.
    ///
    /// Each recognized key is removed as it is consumed; whatever remains at
    /// the end is unknown and rejects the whole descriptor. `name` is
    /// checked first so every later error can say which plugin it is about.
    /// The retired `requires.keystore` marker is accepted silently, but only
    /// when the declared engine version falls in the releases that actually
    /// wrote it.
    pub fn from_properties(
        properties: HashMap<String, String>,
    ) -> Result<PluginDescriptor, DescriptorError> {
        let mut props = properties;

        let name = match props.remove("name") {
            Some(name) if !name.is_empty() => name,
            _ => return Err(DescriptorError::MissingName),
        };
        let description = props
            .remove("description")
            .ok_or_else(|| missing("description", &name))?;
        let version = props
            .remove("version")
            .ok_or_else(|| missing("version", &name))?;

        let raw_engine = props
            .remove("saltline.version")
            .ok_or_else(|| missing("saltline.version", &name))?;
        let saltline_version =
            raw_engine
                .parse::<Version>()
                .map_err(|source| DescriptorError::InvalidEngineVersion {
                    plugin: name.clone(),
                    value: raw_engine.clone(),
                    source,
                })?;

        let runtime_version = props
            .remove("runtime.version")
            .ok_or_else(|| missing("runtime.version", &name))?;
        if !runtime_version_regex().is_match(&runtime_version) {
            return Err(DescriptorError::InvalidRuntimeVersion {
                plugin: name.clone(),
                value: runtime_version,
            });
        }

        let classname = props
            .remove("classname")
            .ok_or_else(|| missing("classname", &name))?;

        let extended_plugins = props
            .remove("extended.plugins")
            .map(|raw| split_extended_plugins(&raw))
            .unwrap_or_default();

        let has_native_controller = match props.remove("has.native.controller") {
            Some(value) => match value.as_str() {
                "true" => true,
                "false" => false,
                _ => {
                    return Err(DescriptorError::InvalidNativeController {
                        plugin: name.clone(),
                        value,
                    })
                }
            },
            None => false,
        };

        if carries_keystore_marker(saltline_version) {
            props.remove("requires.keystore");
        }

        if !props.is_empty() {
            let mut properties: Vec<String> = props.into_keys().collect();
            properties.sort();
            return Err(DescriptorError::UnknownProperties {
                plugin: name.clone(),
                properties,
            });
        }

        Ok(PluginDescriptor {
            name,
            description,
            version,
            saltline_version,
            runtime_version,
            classname,
            extended_plugins,
            has_native_controller,
        })
    }

    /// Reads and validates `plugin-descriptor.properties` from a plugin
    /// directory.
    pub fn read_from_dir(plugin_dir: &Path) -> Result<PluginDescriptor, DescriptorError> {
        let path = plugin_dir.join(DESCRIPTOR_FILENAME);
        let descriptor = PluginDescriptor::from_properties(properties::load(&path)?)?;
        debug!(
            "read plugin descriptor [{}] version [{}] from [{}]",
            descriptor.name,
            descriptor.version,
            path.display()
        );
        Ok(descriptor)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// The plugin's own version token. Opaque: compared for equality, never
    /// ordered.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Engine release the plugin was built against.
    pub fn saltline_version(&self) -> Version {
        self.saltline_version
    }

    /// Runtime the plugin was built for. Opaque but format-checked.
    pub fn runtime_version(&self) -> &str {
        &self.runtime_version
    }

    /// Fully qualified class the loader instantiates as the plugin's entry
    /// point.
    pub fn classname(&self) -> &str {
        &self.classname
    }

    /// Names of plugins whose extension points this plugin extends, in
    /// declaration order.
    pub fn extended_plugins(&self) -> &[String] {
        &self.extended_plugins
    }

    /// Whether the plugin spawns a native controller process.
    pub fn has_native_controller(&self) -> bool {
        self.has_native_controller
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Renders the human-readable information block, one field per line,
    /// with `prefix` applied to every line. The entry point is the last
    /// line. No trailing newline.
    pub fn to_text(&self, prefix: &str) -> String {
        let mut out = String::new();
        out.push_str(&format!("{prefix}- Plugin information:\n"));
        out.push_str(&format!("{prefix}Name: {}\n", self.name));
        out.push_str(&format!("{prefix}Version: {}\n", self.version));
        out.push_str(&format!("{prefix}Saltline version: {}\n", self.saltline_version));
        out.push_str(&format!("{prefix}Runtime version: {}\n", self.runtime_version));
        out.push_str(&format!("{prefix}Description: {}\n", self.description));
        out.push_str(&format!(
            "{prefix}Extended plugins: [{}]\n",
            self.extended_plugins.join(", ")
        ));
        out.push_str(&format!(
            "{prefix}Native controller: {}\n",
            self.has_native_controller
        ));
        out.push_str(&format!("{prefix} * Classname: {}", self.classname));
        out
    }
}

/// Versions that wrote the `requires.keystore` marker, in the descriptor
/// file and on the wire: introduced in 2.0.0-beta2, retired in 2.3.0.
fn carries_keystore_marker(version: Version) -> bool {
    version >= Version::V_2_0_0_BETA2 && version < Version::V_2_3_0
}

/// Splits a comma-delimited plugin list exactly as written. Empty segments
/// and surrounding whitespace survive; descriptors already in the field
/// depend on the precise split.
fn split_extended_plugins(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        Vec::new()
    } else {
        raw.split(',').map(str::to_string).collect()
    }
}

fn missing(property: &'static str, plugin: &str) -> DescriptorError {
    DescriptorError::MissingProperty {
        property,
        plugin: plugin.to_string(),
    }
}

// Plugin identity is (name, version). A node that sees the same pair from
// two peers must treat them as the same installation even when metadata
// like the description was edited between builds.
impl PartialEq for PluginDescriptor {
    fn eq(&self, other: &PluginDescriptor) -> bool {
        self.name == other.name && self.version == other.version
    }
}

impl Eq for PluginDescriptor {}

impl Hash for PluginDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.version.hash(state);
    }
}

impl fmt::Display for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text(""))
    }
}

impl Serialize for PluginDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut doc = serializer.serialize_struct("PluginDescriptor", 8)?;
        doc.serialize_field("name", &self.name)?;
        doc.serialize_field("version", &self.version)?;
        doc.serialize_field("saltline_version", &self.saltline_version)?;
        doc.serialize_field("runtime_version", &self.runtime_version)?;
        doc.serialize_field("description", &self.description)?;
        doc.serialize_field("classname", &self.classname)?;
        doc.serialize_field("extended_plugins", &self.extended_plugins)?;
        doc.serialize_field("has_native_controller", &self.has_native_controller)?;
        doc.end()
    }
}

impl WireCodec for PluginDescriptor {
    fn write_to<W: Write>(&self, writer: &mut WireWriter<W>) -> WireResult<()> {
        writer.write_string(&self.name)?;
        writer.write_string(&self.description)?;
        writer.write_string(&self.version)?;
        if writer.protocol() >= Version::V_2_3_0 {
            self.saltline_version.write_to(writer)?;
            writer.write_string(&self.runtime_version)?;
        }
        writer.write_string(&self.classname)?;
        if writer.protocol() >= Version::V_2_2_0 {
            writer.write_string_seq(&self.extended_plugins)?;
        }
        writer.write_bool(self.has_native_controller)?;
        if carries_keystore_marker(writer.protocol()) {
            // Retired keystore marker. Written as a constant false so that
            // peers still inside the marker era stay aligned.
            writer.write_bool(false)?;
        }
        Ok(())
    }

    fn read_from<R: Read>(reader: &mut WireReader<R>) -> WireResult<PluginDescriptor> {
        let name = reader.read_string()?;
        let description = reader.read_string()?;
        let version = reader.read_string()?;
        let (saltline_version, runtime_version) = if reader.protocol() >= Version::V_2_3_0 {
            (Version::read_from(reader)?, reader.read_string()?)
        } else {
            // Older peers never say which releases a plugin targets; the
            // closest truth is the version the peer itself speaks.
            (reader.protocol(), LEGACY_RUNTIME_VERSION.to_string())
        };
        let classname = reader.read_string()?;
        let extended_plugins = if reader.protocol() >= Version::V_2_2_0 {
            reader.read_string_seq()?
        } else {
            Vec::new()
        };
        let has_native_controller = reader.read_bool()?;
        if carries_keystore_marker(reader.protocol()) {
            // Discarded, but must be consumed to keep the stream aligned.
            reader.read_bool()?;
        }
        Ok(PluginDescriptor {
            name,
            description,
            version,
            saltline_version,
            runtime_version,
            classname,
            extended_plugins,
            has_native_controller,
        })
    }
}
