//! Saltline release versions.
//!
//! Every node advertises the version it was built as, and every wire stream
//! carries the lowest version of the two peers so that both sides agree on
//! which fields exist. Versions are totally ordered, including pre-release
//! qualifiers, and have a stable numeric id used on the wire.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::error::WireResult;
use crate::stream::{WireCodec, WireReader, WireWriter};

/// Pattern a version token must match: `major.minor.patch` with an optional
/// `-alpha<n>`, `-beta<n>`, or `-rc<n>` qualifier.
const VERSION_PATTERN: &str = r"^([0-9]+)\.([0-9]+)\.([0-9]+)(?:-(alpha|beta|rc)([0-9]+))?$";

static VERSION_REGEX: OnceLock<Regex> = OnceLock::new();

fn version_regex() -> &'static Regex {
    VERSION_REGEX.get_or_init(|| Regex::new(VERSION_PATTERN).expect("invalid regex pattern"))
}

/// Pre-release qualifier of a [`Version`].
///
/// Orders as `alpha < beta < rc < release`, with numbered qualifiers ordered
/// by their number within a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Qualifier {
    Alpha(u8),
    Beta(u8),
    Rc(u8),
    Release,
}

impl Qualifier {
    /// Two-digit slot this qualifier occupies in the numeric version id.
    ///
    /// Alphas take 1-25, betas 26-50, release candidates 51-98, and a full
    /// release is 99. Slot 0 is never produced, which keeps ids of real
    /// versions distinguishable from zeroed padding.
    fn id(self) -> u8 {
        match self {
            Qualifier::Alpha(n) => n,
            Qualifier::Beta(n) => 25 + n,
            Qualifier::Rc(n) => 50 + n,
            Qualifier::Release => 99,
        }
    }

    fn from_id(id: u8) -> Option<Qualifier> {
        match id {
            1..=25 => Some(Qualifier::Alpha(id)),
            26..=50 => Some(Qualifier::Beta(id - 25)),
            51..=98 => Some(Qualifier::Rc(id - 50)),
            99 => Some(Qualifier::Release),
            _ => None,
        }
    }

    fn numbered(kind: &str, number: u8) -> Option<Qualifier> {
        let qualifier = match kind {
            "alpha" if (1..=25).contains(&number) => Qualifier::Alpha(number),
            "beta" if (1..=25).contains(&number) => Qualifier::Beta(number),
            "rc" if (1..=48).contains(&number) => Qualifier::Rc(number),
            _ => return None,
        };
        Some(qualifier)
    }
}

/// A Saltline release version.
///
/// Field order gives the derived ordering: major, then minor, then patch,
/// then qualifier, so `2.0.0-beta2 < 2.0.0-rc1 < 2.0.0 < 2.1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    major: u8,
    minor: u8,
    patch: u8,
    qualifier: Qualifier,
}

impl Version {
    /// 1.9.0, the last release of the 1.x line.
    pub const V_1_9_0: Version = Version::release(1, 9, 0);
    /// 2.0.0-beta2, the first build that shipped the node keystore. Plugin
    /// descriptors gained the `requires.keystore` marker here.
    pub const V_2_0_0_BETA2: Version = Version {
        major: 2,
        minor: 0,
        patch: 0,
        qualifier: Qualifier::Beta(2),
    };
    pub const V_2_0_0: Version = Version::release(2, 0, 0);
    pub const V_2_1_0: Version = Version::release(2, 1, 0);
    /// 2.2.0 introduced extensible plugins; descriptors gained
    /// `extended.plugins`.
    pub const V_2_2_0: Version = Version::release(2, 2, 0);
    /// 2.3.0 started carrying the engine and runtime versions in descriptor
    /// streams and retired the keystore marker.
    pub const V_2_3_0: Version = Version::release(2, 3, 0);
    pub const V_2_4_0: Version = Version::release(2, 4, 0);
    /// The version this build advertises.
    pub const CURRENT: Version = Version::V_2_4_0;

    /// A full release version with no qualifier.
    pub const fn release(major: u8, minor: u8, patch: u8) -> Version {
        Version {
            major,
            minor,
            patch,
            qualifier: Qualifier::Release,
        }
    }

    pub fn major(self) -> u8 {
        self.major
    }

    pub fn minor(self) -> u8 {
        self.minor
    }

    pub fn patch(self) -> u8 {
        self.patch
    }

    pub fn qualifier(self) -> Qualifier {
        self.qualifier
    }

    /// Stable numeric form used on the wire: two decimal digits per
    /// component, qualifier in the lowest slot.
    pub fn id(self) -> u32 {
        u32::from(self.major) * 1_000_000
            + u32::from(self.minor) * 10_000
            + u32::from(self.patch) * 100
            + u32::from(self.qualifier.id())
    }

    /// Inverse of [`Version::id`]. Ids whose qualifier slot is zero or whose
    /// major component does not fit a released line are rejected rather than
    /// guessed at.
    pub fn from_id(id: u32) -> Result<Version, VersionError> {
        let major = id / 1_000_000;
        let minor = id / 10_000 % 100;
        let patch = id / 100 % 100;
        let qualifier = Qualifier::from_id((id % 100) as u8);
        match (u8::try_from(major), qualifier) {
            (Ok(major), Some(qualifier)) => Ok(Version {
                major,
                minor: minor as u8,
                patch: patch as u8,
                qualifier,
            }),
            _ => Err(VersionError::UnknownId(id)),
        }
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(token: &str) -> Result<Version, VersionError> {
        let malformed = || VersionError::Malformed(token.to_string());
        let captures = version_regex().captures(token).ok_or_else(malformed)?;
        let component = |index: usize| -> Result<u8, VersionError> {
            captures[index].parse::<u8>().map_err(|_| malformed())
        };
        let qualifier = match captures.get(4) {
            Some(kind) => {
                let number = component(5)?;
                Qualifier::numbered(kind.as_str(), number).ok_or_else(malformed)?
            }
            None => Qualifier::Release,
        };
        Ok(Version {
            major: component(1)?,
            minor: component(2)?,
            patch: component(3)?,
            qualifier,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        match self.qualifier {
            Qualifier::Alpha(n) => write!(f, "-alpha{n}"),
            Qualifier::Beta(n) => write!(f, "-beta{n}"),
            Qualifier::Rc(n) => write!(f, "-rc{n}"),
            Qualifier::Release => Ok(()),
        }
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl WireCodec for Version {
    fn write_to<W: std::io::Write>(&self, writer: &mut WireWriter<W>) -> WireResult<()> {
        writer.write_vint(self.id())
    }

    fn read_from<R: std::io::Read>(reader: &mut WireReader<R>) -> WireResult<Version> {
        Ok(Version::from_id(reader.read_vint()?)?)
    }
}

/// Failure to interpret a version token or wire id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error(
        "malformed version [{0}]: expected major.minor.patch with an optional \
         -alpha/-beta/-rc qualifier"
    )]
    Malformed(String),
    #[error("unknown version id [{0}]")]
    UnknownId(u32),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn v(token: &str) -> Version {
        token.parse().unwrap()
    }

    #[test]
    fn parse_and_display_are_inverses() {
        for token in ["1.9.0", "2.0.0", "2.0.0-alpha1", "2.0.0-beta2", "2.0.0-rc1", "10.20.30"] {
            assert_eq!(v(token).to_string(), token);
        }
    }

    #[test]
    fn parse_rejects_malformed_tokens() {
        for token in [
            "",
            "2",
            "2.0",
            "2.0.0.0",
            "2.0.0-",
            "2.0.0-beta",
            "2.0.0-beta0",
            "2.0.0-beta26",
            "2.0.0-rc49",
            "2.0.0-gamma1",
            "v2.0.0",
            " 2.0.0",
            "2.0.0 ",
            "+2.0.0",
            "256.0.0",
        ] {
            assert_eq!(
                token.parse::<Version>(),
                Err(VersionError::Malformed(token.to_string())),
                "token {token:?} should not parse"
            );
        }
    }

    #[test]
    fn qualifiers_order_below_release() {
        assert!(Version::V_1_9_0 < v("2.0.0-alpha1"));
        assert!(v("2.0.0-alpha1") < v("2.0.0-alpha2"));
        assert!(v("2.0.0-alpha25") < v("2.0.0-beta1"));
        assert!(v("2.0.0-beta2") < v("2.0.0-rc1"));
        assert!(v("2.0.0-rc1") < Version::V_2_0_0);
        assert!(Version::V_2_0_0 < v("2.0.1"));
    }

    #[test]
    fn descriptor_gates_are_ordered() {
        assert!(Version::V_2_0_0_BETA2 < Version::V_2_2_0);
        assert!(Version::V_2_2_0 < Version::V_2_3_0);
        assert!(Version::V_2_3_0 <= Version::CURRENT);
    }

    #[test]
    fn id_uses_two_digit_slots() {
        assert_eq!(Version::V_1_9_0.id(), 1_090_099);
        assert_eq!(v("2.0.0-alpha1").id(), 2_000_001);
        assert_eq!(Version::V_2_0_0_BETA2.id(), 2_000_027);
        assert_eq!(v("2.0.0-rc1").id(), 2_000_051);
        assert_eq!(Version::V_2_0_0.id(), 2_000_099);
        assert_eq!(Version::V_2_3_0.id(), 2_030_099);
    }

    #[test]
    fn from_id_inverts_id() {
        for version in [
            Version::V_1_9_0,
            Version::V_2_0_0_BETA2,
            Version::V_2_0_0,
            Version::V_2_3_0,
            v("3.11.7-rc2"),
        ] {
            assert_eq!(Version::from_id(version.id()), Ok(version));
        }
    }

    #[test]
    fn from_id_rejects_zero_qualifier_slot() {
        assert_eq!(Version::from_id(2_000_000), Err(VersionError::UnknownId(2_000_000)));
        assert_eq!(Version::from_id(0), Err(VersionError::UnknownId(0)));
    }

    #[test]
    fn from_id_rejects_out_of_range_major() {
        assert_eq!(
            Version::from_id(256_000_099),
            Err(VersionError::UnknownId(256_000_099))
        );
    }

    #[test]
    fn serializes_as_display_string() {
        let json = serde_json::to_string(&Version::V_2_0_0_BETA2).unwrap();
        assert_eq!(json, "\"2.0.0-beta2\"");
    }
}
