//! The dispatch engine.
//!
//! # Decision order
//!
//! For an invocation of `identity` on `receiver`:
//!
//! 1. Resolve an override for the receiver's runtime type when the type model knows it as a
//!    subtype of `identity.owner`, otherwise for the owner itself.
//! 2. If an override resolved, look for a matching operation on it (then on its parent
//!    overrides). A match is [`DispatchResult::RunOverride`]. No match on an override that does
//!    not call through is [`DispatchResult::DoNothing`] when the operation belongs to the
//!    replaced type or its ancestors; otherwise the call falls through.
//! 3. An interception handler for `identity` is [`DispatchResult::RunIntercepted`].
//! 4. A safe original operation is [`DispatchResult::RunOriginal`]; an unsafe one is
//!    [`DispatchResult::DoNothing`] with the result type's default. No original operation at
//!    all is [`DispatchError::MissingOriginal`].
//!
//! Resolutions are cached per (type, version). The cache is dropped whenever the version or an
//! environment property changes and on every lifecycle reset. Dispatch results are never cached.

mod execute;

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap as HashMap;
use umbra_shadow_map::{EnvProperties, OverrideIndex, PickerRegistry, ResolveEnv, Resolved, TypeHierarchy, Version};
use umbra_signature::OperationIdentity;

pub use execute::{Invocation, execute, invoke};

use crate::error::DispatchError;
use crate::intercept::{InterceptionHandler, InterceptionRegistry};
use crate::model::TypeModel;
use crate::shadow::{MatchMode, OverrideCatalog, OverrideImpl, OverrideOp};
use crate::value::Value;

/// Executable target chosen for one invocation.
#[derive(Debug, Clone)]
pub enum DispatchResult {
	RunOverride { shadow: Arc<OverrideImpl>, op: Arc<OverrideOp> },
	RunIntercepted(Arc<InterceptionHandler>),
	RunOriginal,
	DoNothing(Value),
}

impl DispatchResult {
	pub fn label(&self) -> &'static str {
		match self {
			Self::RunOverride { .. } => "run-override",
			Self::RunIntercepted(_) => "run-intercepted",
			Self::RunOriginal => "run-original",
			Self::DoNothing(_) => "do-nothing",
		}
	}
}

/// Per-call decision function used at every redirected call site.
pub trait Dispatcher {
	fn dispatch(&self, identity: &OperationIdentity, receiver: &Value, args: &[Value]) -> Result<DispatchResult, DispatchError>;
}

struct EnvState {
	version: Version,
	properties: EnvProperties,
}

pub struct ShadowWrangler {
	index: OverrideIndex,
	catalog: Arc<OverrideCatalog>,
	interceptors: Arc<InterceptionRegistry>,
	model: Arc<TypeModel>,
	pickers: PickerRegistry,
	state: RwLock<EnvState>,
	cache: Mutex<HashMap<(String, Version), Option<Resolved>>>,
	poison: Mutex<Option<String>>,
}

impl ShadowWrangler {
	pub fn new(
		index: OverrideIndex,
		catalog: Arc<OverrideCatalog>,
		interceptors: Arc<InterceptionRegistry>,
		model: Arc<TypeModel>,
		pickers: PickerRegistry,
		version: Version,
	) -> Self {
		Self {
			index,
			catalog,
			interceptors,
			model,
			pickers,
			state: RwLock::new(EnvState {
				version,
				properties: EnvProperties::new(),
			}),
			cache: Mutex::new(HashMap::default()),
			poison: Mutex::new(None),
		}
	}

	pub fn with_properties(self, properties: EnvProperties) -> Self {
		self.state.write().properties = properties;
		self
	}

	pub fn index(&self) -> &OverrideIndex {
		&self.index
	}

	pub fn catalog(&self) -> &Arc<OverrideCatalog> {
		&self.catalog
	}

	pub fn interceptors(&self) -> &Arc<InterceptionRegistry> {
		&self.interceptors
	}

	pub fn model(&self) -> &Arc<TypeModel> {
		&self.model
	}

	pub fn version(&self) -> Version {
		self.state.read().version
	}

	pub fn set_version(&self, version: Version) {
		let mut state = self.state.write();
		if state.version != version {
			state.version = version;
			self.clear_cache();
		}
	}

	pub fn property(&self, key: &str) -> Option<String> {
		self.state.read().properties.get(key).cloned()
	}

	/// Sets a declared environment property. Cached resolutions are dropped since pickers may
	/// read it.
	pub fn set_property(&self, key: impl Into<String>, value: impl Into<String>) {
		self.state.write().properties.insert(key.into(), value.into());
		self.clear_cache();
	}

	pub fn remove_property(&self, key: &str) -> Option<String> {
		let removed = self.state.write().properties.shift_remove(key);
		if removed.is_some() {
			self.clear_cache();
		}
		removed
	}

	pub fn clear_cache(&self) {
		self.cache.lock().clear();
	}

	/// Marks the wrangler unusable; every later dispatch fails with [`DispatchError::Poisoned`].
	pub fn poison(&self, reason: impl Into<String>) {
		let reason = reason.into();
		tracing::error!(%reason, "dispatch poisoned");
		*self.poison.lock() = Some(reason);
	}

	pub fn poisoned(&self) -> Option<String> {
		self.poison.lock().clone()
	}

	/// Resolves the override shadowing `ty` at the current version, through the cache.
	pub fn resolve(&self, ty: &str) -> Result<Option<Resolved>, DispatchError> {
		let state = self.state.read();
		self.resolve_in(ty, &state)
	}

	fn resolve_in(&self, ty: &str, state: &EnvState) -> Result<Option<Resolved>, DispatchError> {
		let key = (ty.to_string(), state.version);
		if let Some(hit) = self.cache.lock().get(&key) {
			return Ok(hit.clone());
		}

		let env = ResolveEnv {
			hierarchy: &*self.model,
			pickers: &self.pickers,
			properties: &state.properties,
		};
		let resolved = self.index.resolve(ty, state.version, &env)?;
		self.cache.lock().insert(key, resolved.clone());
		Ok(resolved)
	}

	/// Type resolution starts from: the receiver's runtime type when it is a known subtype of
	/// `owner`, else `owner`.
	fn dispatch_type<'a>(&self, owner: &'a str, receiver: &'a Value) -> &'a str {
		match receiver.runtime_type() {
			Some(runtime) if runtime != owner && self.model.is_subtype_of(runtime, owner) => runtime,
			_ => owner,
		}
	}

	/// Matching operation on `shadow` or, failing that, on its registered parent overrides.
	fn find_override_op(
		&self,
		shadow: &Arc<OverrideImpl>,
		resolved: &Resolved,
		identity: &OperationIdentity,
		version: Version,
	) -> Result<Option<Arc<OverrideOp>>, DispatchError> {
		let mode = MatchMode::from_loose_flag(resolved.descriptor.loose_signatures);
		let mut current = Arc::clone(shadow);
		for _ in 0..=self.catalog.len() {
			if let Some(op) = current.find_op(identity, version, mode, &*self.model)? {
				return Ok(Some(Arc::clone(op)));
			}

			let Some(parent_name) = current.parent() else {
				return Ok(None);
			};
			let registered = self
				.index
				.for_override(parent_name)
				.any(|d| d.supports(version) && self.model.is_subtype_of(&resolved.level, &d.original_type));
			if !registered {
				tracing::trace!(shadow = current.name(), parent = parent_name, %version, "parent override not active; stopping");
				return Ok(None);
			}
			let Some(parent) = self.catalog.get(parent_name) else {
				return Ok(None);
			};
			current = Arc::clone(parent);
		}
		tracing::warn!(shadow = shadow.name(), "override parent chain loops; operation treated as absent");
		Ok(None)
	}

	/// Whether a replacing override registered at `level` covers `identity`: the operation is
	/// declared on `level` or one of its ancestors, or the type model does not know it.
	fn replaces(&self, level: &str, identity: &OperationIdentity) -> bool {
		match self.model.find_op(identity) {
			Some((declaring, _)) => self.model.is_subtype_of(level, declaring),
			None => true,
		}
	}
}

impl Dispatcher for ShadowWrangler {
	fn dispatch(&self, identity: &OperationIdentity, receiver: &Value, _args: &[Value]) -> Result<DispatchResult, DispatchError> {
		if let Some(reason) = self.poisoned() {
			return Err(DispatchError::Poisoned(reason));
		}

		let state = self.state.read();
		let version = state.version;
		let ty = self.dispatch_type(&identity.owner, receiver);

		if let Some(resolved) = self.resolve_in(ty, &state)? {
			let override_type = &resolved.descriptor.override_type;
			let shadow = self
				.catalog
				.get(override_type)
				.ok_or_else(|| DispatchError::UnknownOverride(override_type.clone()))?;

			if let Some(op) = self.find_override_op(shadow, &resolved, identity, version)? {
				tracing::debug!(%identity, shadow = shadow.name(), "dispatch: run-override");
				return Ok(DispatchResult::RunOverride {
					shadow: Arc::clone(shadow),
					op,
				});
			}
			if !resolved.descriptor.call_through && self.replaces(&resolved.level, identity) {
				tracing::debug!(%identity, shadow = shadow.name(), "dispatch: override replaces original; do-nothing");
				return Ok(DispatchResult::DoNothing(Value::default_for(&identity.result)));
			}
			tracing::trace!(%identity, shadow = shadow.name(), "override lacks operation; falling through");
		}

		if let Some(handler) = self.interceptors.lookup(identity) {
			tracing::debug!(%identity, key = %handler.key(), "dispatch: run-intercepted");
			return Ok(DispatchResult::RunIntercepted(handler));
		}

		match self.model.find_op(identity) {
			Some((_, op)) if op.is_safe() => {
				tracing::debug!(%identity, "dispatch: run-original");
				Ok(DispatchResult::RunOriginal)
			}
			Some(_) => {
				tracing::debug!(%identity, "dispatch: unsafe original; do-nothing");
				Ok(DispatchResult::DoNothing(Value::default_for(&identity.result)))
			}
			None => Err(DispatchError::MissingOriginal {
				owner: identity.owner.clone(),
				operation: identity.to_string(),
			}),
		}
	}
}

impl std::fmt::Debug for ShadowWrangler {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ShadowWrangler")
			.field("version", &self.version())
			.field("overrides", &self.index.len())
			.field("interceptors", &self.interceptors.len())
			.field("poisoned", &self.poisoned().is_some())
			.finish()
	}
}
