use std::fmt;

use crate::version::Version;

/// Why several applicable overrides could not be narrowed to one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmbiguityReason {
	/// No candidate declared a picker.
	NoPicker,
	/// Candidates at the same level declared different pickers.
	ConflictingPickers(Vec<String>),
	/// The declared picker is not registered in the environment.
	UnknownPicker(String),
	/// The picker returned no result.
	PickerDeclined(String),
	/// The picker returned a name that is not among the candidates.
	PickedOutsideCandidates { picker: String, picked: String },
}

impl fmt::Display for AmbiguityReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::NoPicker => write!(f, "no picker declared"),
			Self::ConflictingPickers(names) => write!(f, "conflicting pickers declared: {}", names.join(", ")),
			Self::UnknownPicker(name) => write!(f, "picker {name:?} is not registered"),
			Self::PickerDeclined(name) => write!(f, "picker {name:?} returned no override"),
			Self::PickedOutsideCandidates { picker, picked } => {
				write!(f, "picker {picker:?} returned {picked:?}, which is not a candidate")
			}
		}
	}
}

/// Fatal override-resolution failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
	#[error("ambiguous override for {original} (registered at {level}) at version {version}: candidates [{}]; {reason}", .candidates.join(", "))]
	Ambiguous {
		original: String,
		level: String,
		version: Version,
		candidates: Vec<String>,
		reason: AmbiguityReason,
	},
}

/// Index construction failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
	#[error("duplicate override registration: {override_type} for {original_type}")]
	Duplicate { override_type: String, original_type: String },
	#[error("override {override_type} for {original_type} has inverted version range {range}")]
	InvalidRange {
		override_type: String,
		original_type: String,
		range: String,
	},
}
