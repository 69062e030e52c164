//! Interception registry: synthetic results for operations that cannot run in the sandbox.
//!
//! Interception is a narrow escape hatch, not a dispatch mechanism. Keys never walk the type
//! hierarchy. A lookup tries, in order:
//!
//! 1. the exact [`OperationIdentity`],
//! 2. the owner type and operation name (any parameter or result types),
//! 3. the owner type alone (every operation of that type).
//!
//! The registry is readable while registrations happen: writers publish a new snapshot with a
//! compare-and-swap loop, readers load whichever snapshot is current.

mod builtin;

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use rustc_hash::FxHashMap as HashMap;
use umbra_signature::{OperationIdentity, SignatureError};

pub use builtin::builtin_interceptors;

use crate::error::DispatchError;
use crate::value::Value;

/// Context handed to an interception body.
pub struct InterceptCall<'a> {
	pub identity: &'a OperationIdentity,
	pub receiver: &'a Value,
	pub declaring_type: &'a str,
	pub args: &'a [Value],
}

impl InterceptCall<'_> {
	pub fn arg(&self, index: usize) -> Result<&Value, DispatchError> {
		self.args
			.get(index)
			.ok_or_else(|| DispatchError::raised(self.identity, format!("missing argument #{index}")))
	}
}

pub type InterceptBody = Arc<dyn Fn(&InterceptCall<'_>) -> Result<Value, DispatchError> + Send + Sync>;

/// What an interception handler claims.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InterceptKey {
	Exact(OperationIdentity),
	Named { owner: String, name: String },
	Owner(String),
}

impl fmt::Display for InterceptKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Exact(identity) => write!(f, "{identity}"),
			Self::Named { owner, name } => write!(f, "{owner}.{name}"),
			Self::Owner(owner) => write!(f, "{owner}.*"),
		}
	}
}

#[derive(Clone)]
pub struct InterceptionHandler {
	key: InterceptKey,
	body: InterceptBody,
}

impl InterceptionHandler {
	pub fn new<F>(key: InterceptKey, body: F) -> Self
	where
		F: Fn(&InterceptCall<'_>) -> Result<Value, DispatchError> + Send + Sync + 'static,
	{
		Self { key, body: Arc::new(body) }
	}

	/// Handler for one exact descriptor.
	pub fn exact<F>(descriptor: &str, body: F) -> Result<Self, SignatureError>
	where
		F: Fn(&InterceptCall<'_>) -> Result<Value, DispatchError> + Send + Sync + 'static,
	{
		Ok(Self::new(InterceptKey::Exact(OperationIdentity::parse(descriptor)?), body))
	}

	/// Handler for every overload of `owner.name`.
	pub fn named<F>(owner: &str, name: &str, body: F) -> Self
	where
		F: Fn(&InterceptCall<'_>) -> Result<Value, DispatchError> + Send + Sync + 'static,
	{
		Self::new(
			InterceptKey::Named {
				owner: owner.to_string(),
				name: name.to_string(),
			},
			body,
		)
	}

	/// Handler that does nothing and returns the default for the intercepted result type.
	pub fn no_op(key: InterceptKey) -> Self {
		Self::new(key, |call| Ok(Value::default_for(&call.identity.result)))
	}

	pub fn key(&self) -> &InterceptKey {
		&self.key
	}

	pub fn compute(&self, call: &InterceptCall<'_>) -> Result<Value, DispatchError> {
		(self.body)(call)
	}
}

impl fmt::Debug for InterceptionHandler {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("InterceptionHandler").field(&self.key).finish()
	}
}

/// A registration replaced an earlier handler for the same key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptorCollision {
	pub key: InterceptKey,
	/// Number of the registration that was replaced, counting from zero.
	pub replaced: usize,
	pub replaced_by: usize,
}

#[derive(Clone, Default)]
struct InterceptSnapshot {
	exact: HashMap<OperationIdentity, Slot>,
	named: HashMap<(String, String), Slot>,
	owners: HashMap<String, Slot>,
	registrations: usize,
	collisions: Vec<InterceptorCollision>,
}

#[derive(Clone)]
struct Slot {
	seq: usize,
	handler: Arc<InterceptionHandler>,
}

impl InterceptSnapshot {
	fn insert(&mut self, handler: Arc<InterceptionHandler>) -> Option<Slot> {
		let seq = self.registrations;
		self.registrations += 1;
		let slot = Slot { seq, handler };
		let prev = match slot.handler.key.clone() {
			InterceptKey::Exact(identity) => self.exact.insert(identity, slot),
			InterceptKey::Named { owner, name } => self.named.insert((owner, name), slot),
			InterceptKey::Owner(owner) => self.owners.insert(owner, slot),
		};
		if let Some(prev) = &prev {
			self.collisions.push(InterceptorCollision {
				key: prev.handler.key.clone(),
				replaced: prev.seq,
				replaced_by: seq,
			});
		}
		prev
	}

	fn lookup(&self, identity: &OperationIdentity) -> Option<&Slot> {
		self.exact
			.get(identity)
			.or_else(|| self.named.get(&(identity.owner.clone(), identity.name.clone())))
			.or_else(|| self.owners.get(&identity.owner))
	}
}

pub struct InterceptionRegistry {
	snap: ArcSwap<InterceptSnapshot>,
}

impl Default for InterceptionRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl InterceptionRegistry {
	pub fn new() -> Self {
		Self {
			snap: ArcSwap::from_pointee(InterceptSnapshot::default()),
		}
	}

	pub fn with_handlers(handlers: impl IntoIterator<Item = InterceptionHandler>) -> Self {
		let registry = Self::new();
		for handler in handlers {
			registry.register(handler);
		}
		registry
	}

	/// Registers `handler`; the last registration for a key wins.
	///
	/// Replacing a handler is logged and recorded in [`Self::collisions`], not rejected.
	pub fn register(&self, handler: InterceptionHandler) -> Option<Arc<InterceptionHandler>> {
		let handler = Arc::new(handler);
		loop {
			let cur = self.snap.load_full();
			let mut next = (*cur).clone();
			let replaced = next.insert(Arc::clone(&handler));

			let next_arc = Arc::new(next);
			let prev = self.snap.compare_and_swap(&cur, next_arc);
			if Arc::ptr_eq(&prev, &cur) {
				if let Some(replaced) = &replaced {
					tracing::warn!(key = %handler.key, replaced = replaced.seq, "interceptor re-registered; last registration wins");
				}
				return replaced.map(|slot| slot.handler);
			}
		}
	}

	pub fn lookup(&self, identity: &OperationIdentity) -> Option<Arc<InterceptionHandler>> {
		self.snap.load().lookup(identity).map(|slot| Arc::clone(&slot.handler))
	}

	pub fn collisions(&self) -> Vec<InterceptorCollision> {
		self.snap.load().collisions.clone()
	}

	pub fn len(&self) -> usize {
		let snap = self.snap.load();
		snap.exact.len() + snap.named.len() + snap.owners.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl fmt::Debug for InterceptionRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("InterceptionRegistry")
			.field("handlers", &self.len())
			.field("collisions", &self.snap.load().collisions.len())
			.finish()
	}
}
