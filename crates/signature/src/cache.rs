//! Process-lifetime descriptor memo.
//!
//! Parsing is pure, so a successful parse can be shared for as long as the process lives.
//! Failures are not cached; a malformed descriptor is a call-site generation bug and is
//! reported every time it is seen.

use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use rustc_hash::FxHashMap as HashMap;

use crate::{OperationIdentity, SignatureError};

static GLOBAL: LazyLock<SignatureCache> = LazyLock::new(SignatureCache::default);

#[derive(Default)]
pub struct SignatureCache {
	entries: RwLock<HashMap<Box<str>, Arc<OperationIdentity>>>,
}

impl SignatureCache {
	/// Shared cache used by call sites that do not carry their own.
	pub fn global() -> &'static SignatureCache {
		&GLOBAL
	}

	/// Returns the parsed identity for `descriptor`, parsing at most once per distinct string.
	pub fn parse(&self, descriptor: &str) -> Result<Arc<OperationIdentity>, SignatureError> {
		if let Some(hit) = self.entries.read().get(descriptor) {
			return Ok(hit.clone());
		}

		let parsed = Arc::new(OperationIdentity::parse(descriptor)?);
		let mut entries = self.entries.write();
		Ok(entries.entry(descriptor.into()).or_insert(parsed).clone())
	}

	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
