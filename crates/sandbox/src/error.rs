use std::path::PathBuf;

use umbra_shadow_map::{IndexError, ResolveError, Version};
use umbra_signature::{OperationIdentity, SignatureError};

/// Boxed failure reported by override reset hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Fatal dispatch and execution errors.
///
/// Every variant propagates to the caller of dispatch; none is converted into a default value.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
	#[error(transparent)]
	Resolve(#[from] ResolveError),

	#[error(transparent)]
	Signature(#[from] SignatureError),

	/// The plan required an original operation the type model does not have.
	#[error("no original operation {operation} on {owner}")]
	MissingOriginal { owner: String, operation: String },

	/// A direct call matched more than one original overload.
	#[error("direct call {owner}.{name} with {arity} argument(s) matches {matches} overloads")]
	AmbiguousOriginal { owner: String, name: String, arity: usize, matches: usize },

	/// Several override operations match an identity equally well.
	#[error("{shadow}: {identity} matches override operations ({}) equally well", .candidates.join("), ("))]
	AmbiguousOverrideOp { shadow: String, identity: String, candidates: Vec<String> },

	/// An index entry names an override implementation the catalog does not hold.
	#[error("override implementation {0} is not registered")]
	UnknownOverride(String),

	/// A handler body reported a failure.
	#[error("{identity}: {message}")]
	Raised { identity: String, message: String },

	/// A lifecycle reset failed earlier; the environment can no longer be trusted.
	#[error("environment poisoned: {0}")]
	Poisoned(String),
}

impl DispatchError {
	pub fn raised(identity: &OperationIdentity, message: impl Into<String>) -> Self {
		Self::Raised {
			identity: identity.to_string(),
			message: message.into(),
		}
	}
}

/// A reset hook failed. The reset is abandoned at that override and never retried.
#[derive(Debug, thiserror::Error)]
#[error("reset of {override_type} at version {version} failed: {source}")]
pub struct ResetError {
	pub override_type: String,
	pub version: Version,
	#[source]
	pub source: BoxError,
}

/// Errors raised while assembling an [`crate::Environment`].
#[derive(Debug, thiserror::Error)]
pub enum EnvironmentError {
	#[error(transparent)]
	Index(#[from] IndexError),

	#[error("override implementation {name} is not in the catalog{}", suggestion_suffix(.suggestion))]
	UnknownOverride { name: String, suggestion: Option<String> },

	#[error("picker {picker} declared by {override_type} is not registered")]
	UnknownPicker { picker: String, override_type: String },

	#[error("override {override_type} implements {implemented} but is registered for {registered}")]
	MismatchedOriginal { override_type: String, implemented: String, registered: String },

	#[error("no platform version configured")]
	MissingVersion,

	#[error("config errors: {}", format_config_errors(.0))]
	Config(Vec<(PathBuf, String)>),
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
	suggestion.as_ref().map(|s| format!(" (did you mean {s}?)")).unwrap_or_default()
}

fn format_config_errors(errors: &[(PathBuf, String)]) -> String {
	errors
		.iter()
		.map(|(path, message)| format!("{}: {message}", path.display()))
		.collect::<Vec<_>>()
		.join("; ")
}
