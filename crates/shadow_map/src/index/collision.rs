//! Duplicate-registration vocabulary.

/// How a second registration of the same override for the same original type is handled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
	/// Fail the build with [`crate::IndexError::Duplicate`].
	Reject,
	/// Keep the first registration seen.
	#[default]
	FirstWins,
	/// Overwrite with the last registration seen.
	LastWins,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
	/// Existing registration kept; incoming dropped.
	KeptExisting,
	/// Existing registration replaced by incoming.
	ReplacedExisting,
}

/// A recorded duplicate registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
	pub original_type: String,
	pub override_type: String,
	pub policy: DuplicatePolicy,
	pub resolution: Resolution,
}
