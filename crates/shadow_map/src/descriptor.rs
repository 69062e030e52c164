use std::fmt;

use crate::version::{Version, VersionRange};

/// Metadata describing one override's applicability to an original type.
///
/// Created once at registration time and immutable for the life of the index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OverrideDescriptor {
	/// Name of the override implementation type.
	pub override_type: String,
	/// Name of the original type being shadowed.
	pub original_type: String,
	pub range: VersionRange,
	/// Picker consulted when several overrides apply to the same type and version.
	pub picker: Option<String>,
	/// Permit assignable (rather than exact) parameter matching.
	pub loose_signatures: bool,
	/// When false the override fully replaces the original: operations it does not
	/// implement do nothing instead of running the original.
	pub call_through: bool,
}

impl OverrideDescriptor {
	/// Creates a descriptor with an unbounded range, no picker, exact matching and call-through.
	pub fn new(override_type: impl Into<String>, original_type: impl Into<String>) -> Self {
		Self {
			override_type: override_type.into(),
			original_type: original_type.into(),
			range: VersionRange::UNBOUNDED,
			picker: None,
			loose_signatures: false,
			call_through: true,
		}
	}

	pub fn with_range(mut self, range: VersionRange) -> Self {
		self.range = range;
		self
	}

	pub fn with_picker(mut self, picker: impl Into<String>) -> Self {
		self.picker = Some(picker.into());
		self
	}

	pub fn with_loose_signatures(mut self, on: bool) -> Self {
		self.loose_signatures = on;
		self
	}

	pub fn with_call_through(mut self, on: bool) -> Self {
		self.call_through = on;
		self
	}

	#[inline]
	pub fn supports(&self, version: Version) -> bool {
		self.range.contains(version)
	}
}

impl fmt::Display for OverrideDescriptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} shadows {} {}", self.override_type, self.original_type, self.range)
	}
}
