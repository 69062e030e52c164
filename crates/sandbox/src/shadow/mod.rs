//! Override implementations and the catalog that holds them.
//!
//! An [`OverrideImpl`] is the executable side of an
//! [`OverrideDescriptor`](umbra_shadow_map::OverrideDescriptor): it names the original type it
//! stands in for, carries its operations (each with its own version range) and may carry a reset
//! hook that clears whatever process-wide state its bodies keep. Bodies capture their state
//! through `Arc`s; the lifecycle resetter is the only path that clears it.

mod matching;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use umbra_shadow_map::{TypeHierarchy, Version, VersionRange};
use umbra_signature::OperationIdentity;

pub use matching::{MatchMode, MatchQuality, match_params};

use crate::direct::DirectCallProxy;
use crate::error::{BoxError, DispatchError};
use crate::value::Value;

/// Context handed to an override operation body.
pub struct OverrideCall<'a> {
	pub identity: &'a OperationIdentity,
	pub receiver: &'a Value,
	pub args: &'a [Value],
	pub version: Version,
	/// Route to the original behavior; never re-enters dispatch.
	pub direct: &'a DirectCallProxy,
}

impl OverrideCall<'_> {
	pub fn arg(&self, index: usize) -> Result<&Value, DispatchError> {
		self.args
			.get(index)
			.ok_or_else(|| DispatchError::raised(self.identity, format!("missing argument #{index}")))
	}

	/// Runs the original operation this call was redirected from.
	pub fn call_original(&self, args: &[Value]) -> Result<Value, DispatchError> {
		self.direct.call_identity(self.receiver, self.identity, args)
	}
}

pub type OverrideBody = Arc<dyn Fn(&OverrideCall<'_>) -> Result<Value, DispatchError> + Send + Sync>;
pub type ResetHook = Arc<dyn Fn() -> Result<(), BoxError> + Send + Sync>;

pub struct OverrideOp {
	pub name: String,
	pub params: Vec<String>,
	pub result: String,
	pub range: VersionRange,
	body: OverrideBody,
}

impl OverrideOp {
	pub fn new<F>(name: &str, params: &[&str], result: &str, body: F) -> Self
	where
		F: Fn(&OverrideCall<'_>) -> Result<Value, DispatchError> + Send + Sync + 'static,
	{
		Self {
			name: name.to_string(),
			params: params.iter().map(|p| p.to_string()).collect(),
			result: result.to_string(),
			range: VersionRange::UNBOUNDED,
			body: Arc::new(body),
		}
	}

	pub fn with_range(mut self, range: VersionRange) -> Self {
		self.range = range;
		self
	}

	pub fn run(&self, call: &OverrideCall<'_>) -> Result<Value, DispatchError> {
		(self.body)(call)
	}
}

impl fmt::Debug for OverrideOp {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}({}) {}", self.name, self.params.join(", "), self.range)
	}
}

pub struct OverrideImpl {
	name: String,
	original: String,
	extends: Option<String>,
	ops: Vec<Arc<OverrideOp>>,
	reset: Option<ResetHook>,
}

impl OverrideImpl {
	pub fn new(name: impl Into<String>, original: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			original: original.into(),
			extends: None,
			ops: Vec::new(),
			reset: None,
		}
	}

	/// Declares the parent override searched for operations this one lacks.
	pub fn extends(mut self, parent: impl Into<String>) -> Self {
		self.extends = Some(parent.into());
		self
	}

	/// Adds an operation. Operations with an inverted version range can never apply and are
	/// dropped with a warning.
	pub fn op(mut self, op: OverrideOp) -> Self {
		if !op.range.is_valid() {
			tracing::warn!(shadow = %self.name, op = ?op, "override operation has an inverted version range; ignored");
			return self;
		}
		self.ops.push(Arc::new(op));
		self
	}

	pub fn on_reset<F>(mut self, hook: F) -> Self
	where
		F: Fn() -> Result<(), BoxError> + Send + Sync + 'static,
	{
		self.reset = Some(Arc::new(hook));
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn original(&self) -> &str {
		&self.original
	}

	pub fn parent(&self) -> Option<&str> {
		self.extends.as_deref()
	}

	pub fn ops(&self) -> &[Arc<OverrideOp>] {
		&self.ops
	}

	pub fn reset_hook(&self) -> Option<&ResetHook> {
		self.reset.as_ref()
	}

	/// Best operation for `identity` at `version`: an exact parameter match, else the loose match
	/// with the closest supertypes. Two operations tied for best are an error.
	///
	/// Operations whose range excludes `version` are treated as absent.
	pub fn find_op(
		&self,
		identity: &OperationIdentity,
		version: Version,
		mode: MatchMode,
		hierarchy: &dyn TypeHierarchy,
	) -> Result<Option<&Arc<OverrideOp>>, DispatchError> {
		let matches: Vec<_> = self
			.ops
			.iter()
			.filter(|op| op.name == identity.name && op.range.contains(version))
			.filter_map(|op| match_params(&op.params, &identity.params, mode, hierarchy).map(|q| (q, op)))
			.collect();
		let Some(best) = matches.iter().map(|(quality, _)| *quality).min() else {
			return Ok(None);
		};

		let mut winners = matches.into_iter().filter(|(quality, _)| *quality == best).map(|(_, op)| op);
		let first = winners.next();
		let rest: Vec<_> = winners.collect();
		if rest.is_empty() {
			return Ok(first);
		}
		let candidates = first.into_iter().chain(rest).map(|op| op.params.join(", ")).collect();
		Err(DispatchError::AmbiguousOverrideOp {
			shadow: self.name.clone(),
			identity: identity.to_string(),
			candidates,
		})
	}
}

impl fmt::Debug for OverrideImpl {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("OverrideImpl")
			.field("name", &self.name)
			.field("original", &self.original)
			.field("extends", &self.extends)
			.field("ops", &self.ops)
			.field("resettable", &self.reset.is_some())
			.finish()
	}
}

/// Override implementations by name, in registration order.
#[derive(Debug, Clone, Default)]
pub struct OverrideCatalog {
	entries: IndexMap<String, Arc<OverrideImpl>>,
}

impl OverrideCatalog {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers an implementation, returning the one it replaced.
	pub fn register(&mut self, shadow: OverrideImpl) -> Option<Arc<OverrideImpl>> {
		self.entries.insert(shadow.name.clone(), Arc::new(shadow))
	}

	pub fn with(mut self, shadow: OverrideImpl) -> Self {
		self.register(shadow);
		self
	}

	pub fn get(&self, name: &str) -> Option<&Arc<OverrideImpl>> {
		self.entries.get(name)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.entries.keys().map(String::as_str)
	}

	/// Closest registered name to `name`, for diagnostics.
	pub fn suggest(&self, name: &str) -> Option<String> {
		self.names()
			.min_by_key(|candidate| strsim::levenshtein(name, candidate))
			.filter(|candidate| strsim::levenshtein(name, candidate) <= 3)
			.map(str::to_string)
	}
}

#[cfg(test)]
mod tests {
	use rustc_hash::FxHashMap;
	use umbra_shadow_map::FlatHierarchy;

	use crate::value::OBJECT;

	use super::*;

	fn noop(_: &OverrideCall<'_>) -> Result<Value, DispatchError> {
		Ok(Value::Void)
	}

	#[test]
	fn find_op_prefers_exact_and_respects_ranges() {
		let shadow = OverrideImpl::new("ShadowPaint", "app.Paint")
			.op(OverrideOp::new("setColor", &["java.lang.Object"], "void", noop))
			.op(OverrideOp::new("setColor", &["app.Color"], "void", noop))
			.op(OverrideOp::new("measure", &[], "float", noop).with_range(VersionRange::at_least(30)))
			.op(OverrideOp::new("broken", &[], "void", noop).with_range(VersionRange::between(9, 1)));

		let set_color = OperationIdentity::parse("app.Paint/setColor(Lapp/Color;)V").unwrap();
		let exact = shadow.find_op(&set_color, Version(21), MatchMode::Loose, &FlatHierarchy).unwrap().unwrap();
		assert_eq!(exact.params, ["app.Color"]);

		let measure = OperationIdentity::parse("app.Paint/measure()F").unwrap();
		assert!(shadow.find_op(&measure, Version(29), MatchMode::Exact, &FlatHierarchy).unwrap().is_none());
		assert!(shadow.find_op(&measure, Version(30), MatchMode::Exact, &FlatHierarchy).unwrap().is_some());
		assert_eq!(shadow.ops().len(), 3);
	}

	fn attach(params: &[&str]) -> OverrideOp {
		OverrideOp::new("attach", params, "void", noop)
	}

	#[test]
	fn loose_match_ignores_declaration_order() {
		let mut h = FxHashMap::default();
		h.insert("app.Activity".to_string(), "app.Context".to_string());
		let identity = OperationIdentity::parse("app.Window/attach(Lapp/Activity;)V").unwrap();

		let object_first = OverrideImpl::new("ShadowWindow", "app.Window").op(attach(&[OBJECT])).op(attach(&["app.Context"]));
		let context_first = OverrideImpl::new("ShadowWindow", "app.Window").op(attach(&["app.Context"])).op(attach(&[OBJECT]));

		for shadow in [object_first, context_first] {
			let op = shadow.find_op(&identity, Version(30), MatchMode::Loose, &h).unwrap().unwrap();
			assert_eq!(op.params, ["app.Context"]);
		}
	}

	#[test]
	fn equally_close_loose_matches_are_ambiguous() {
		let mut h = FxHashMap::default();
		h.insert("app.Activity".to_string(), "app.Context".to_string());
		let shadow = OverrideImpl::new("ShadowWindow", "app.Window")
			.op(OverrideOp::new("bind", &["app.Context", OBJECT], "void", noop))
			.op(OverrideOp::new("bind", &[OBJECT, "app.Context"], "void", noop));
		let identity = OperationIdentity::parse("app.Window/bind(Lapp/Activity;Lapp/Activity;)V").unwrap();

		let err = shadow.find_op(&identity, Version(30), MatchMode::Loose, &h).unwrap_err();
		assert!(matches!(err, DispatchError::AmbiguousOverrideOp { ref candidates, .. } if candidates.len() == 2), "{err}");
	}

	#[test]
	fn catalog_suggests_near_names() {
		let catalog = OverrideCatalog::new()
			.with(OverrideImpl::new("ShadowLooper", "android.os.Looper"))
			.with(OverrideImpl::new("ShadowToast", "android.widget.Toast"));
		assert_eq!(catalog.suggest("ShadowLoper").as_deref(), Some("ShadowLooper"));
		assert_eq!(catalog.suggest("Unrelated"), None);
	}
}
