/// Descriptor parsing failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
	/// The descriptor could not be fully consumed.
	#[error("malformed signature {descriptor:?} at byte {offset}: {reason}")]
	Malformed {
		descriptor: String,
		offset: usize,
		reason: &'static str,
	},
}

impl SignatureError {
	pub(crate) fn malformed(descriptor: &str, offset: usize, reason: &'static str) -> Self {
		Self::Malformed {
			descriptor: descriptor.to_string(),
			offset,
			reason,
		}
	}

	/// Returns the descriptor that failed to parse.
	pub fn descriptor(&self) -> &str {
		match self {
			Self::Malformed { descriptor, .. } => descriptor,
		}
	}
}
