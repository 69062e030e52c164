//! Platform versions and inclusive version ranges.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A platform version number (API level).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(pub u32);

impl fmt::Display for Version {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<u32> for Version {
	fn from(v: u32) -> Self {
		Self(v)
	}
}

/// Inclusive version range; `None` on either side means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VersionRange {
	pub min: Option<Version>,
	pub max: Option<Version>,
}

impl VersionRange {
	pub const UNBOUNDED: Self = Self { min: None, max: None };

	pub fn new(min: Option<Version>, max: Option<Version>) -> Self {
		Self { min, max }
	}

	/// `[min, max]`, both inclusive.
	pub fn between(min: u32, max: u32) -> Self {
		Self::new(Some(Version(min)), Some(Version(max)))
	}

	pub fn at_least(min: u32) -> Self {
		Self::new(Some(Version(min)), None)
	}

	pub fn at_most(max: u32) -> Self {
		Self::new(None, Some(Version(max)))
	}

	#[inline]
	pub fn contains(&self, version: Version) -> bool {
		self.min.is_none_or(|min| min <= version) && self.max.is_none_or(|max| version <= max)
	}

	/// False when both bounds are set and `min > max`; such a range matches nothing.
	pub fn is_valid(&self) -> bool {
		match (self.min, self.max) {
			(Some(min), Some(max)) => min <= max,
			_ => true,
		}
	}
}

impl fmt::Display for VersionRange {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let bound = |b: Option<Version>| b.map_or_else(|| "*".to_string(), |v| v.to_string());
		write!(f, "[{}, {}]", bound(self.min), bound(self.max))
	}
}
