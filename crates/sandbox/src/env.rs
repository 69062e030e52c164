//! Sandbox environment: the assembled index, registries and engine for one test environment.
//!
//! # Construction
//!
//! [`EnvironmentBuilder`] collects the three externally supplied inputs (current version,
//! registered override descriptors, configured interceptors) either directly, from an
//! [`EnvironmentProvider`], or from declarative configuration. [`EnvironmentBuilder::build`]
//! cross-checks them against the override catalog and picker registry so that configuration
//! problems surface once, at environment start, rather than on some later call.
//!
//! # Lifecycle
//!
//! The index and interception registry live as long as the [`Environment`]. Between tests the
//! lifecycle integration calls [`Environment::reset_all`] (or holds a [`ResetGuard`]). A reset
//! that fails poisons the environment.

use std::path::Path;
use std::sync::Arc;

use umbra_shadow_map::config::{OverrideConfig, load_config_from_dir};
use umbra_shadow_map::{DuplicatePolicy, EnvProperties, OverrideDescriptor, OverrideIndex, OverridePicker, PickerRegistry, Resolved, Version};
use umbra_signature::{OperationIdentity, SignatureCache};

use crate::direct::DirectCallProxy;
use crate::error::{DispatchError, EnvironmentError};
use crate::intercept::{InterceptionHandler, InterceptionRegistry, builtin_interceptors};
use crate::model::TypeModel;
use crate::reset::{LifecycleResetter, ResetGuard, ResetReport};
use crate::shadow::{OverrideCatalog, OverrideImpl};
use crate::value::Value;
use crate::wrangler::{DispatchResult, Dispatcher, Invocation, ShadowWrangler, execute};

/// Inputs an environment consumes from its collaborators.
pub trait EnvironmentProvider {
	fn current_version(&self) -> Version;

	fn registered_overrides(&self) -> Vec<OverrideDescriptor>;

	fn configured_interceptors(&self) -> Vec<InterceptionHandler>;

	/// Declared environment state visible to pickers.
	fn properties(&self) -> EnvProperties {
		EnvProperties::new()
	}
}

pub struct EnvironmentBuilder {
	version: Option<Version>,
	properties: EnvProperties,
	descriptors: Vec<OverrideDescriptor>,
	interceptors: Vec<InterceptionHandler>,
	model: TypeModel,
	catalog: OverrideCatalog,
	pickers: PickerRegistry,
	duplicate_policy: DuplicatePolicy,
}

impl Default for EnvironmentBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl EnvironmentBuilder {
	/// Empty builder. Built-in interceptors are not included; see
	/// [`Self::with_builtin_interceptors`].
	pub fn new() -> Self {
		Self {
			version: None,
			properties: EnvProperties::new(),
			descriptors: Vec::new(),
			interceptors: Vec::new(),
			model: TypeModel::new(),
			catalog: OverrideCatalog::new(),
			pickers: PickerRegistry::new(),
			duplicate_policy: DuplicatePolicy::default(),
		}
	}

	pub fn from_provider(provider: &dyn EnvironmentProvider) -> Self {
		Self::new()
			.version(provider.current_version())
			.properties(provider.properties())
			.descriptors(provider.registered_overrides())
			.interceptors(provider.configured_interceptors())
	}

	/// Applies a merged configuration: version (if set), properties and override descriptors.
	pub fn config(mut self, config: &OverrideConfig) -> Self {
		if let Some(version) = config.environment.version {
			self.version = Some(version);
		}
		self.properties.extend(config.environment.properties.clone());
		self.descriptors.extend(config.descriptors());
		self
	}

	/// Loads configuration layers from `dir` and applies them.
	///
	/// Any file error fails the whole load; entry-level warnings have already been logged and are
	/// not errors.
	pub fn config_dir(self, dir: &Path) -> Result<Self, EnvironmentError> {
		let report = load_config_from_dir(dir);
		if !report.errors.is_empty() {
			return Err(EnvironmentError::Config(report.errors));
		}
		Ok(match report.config {
			Some(config) => self.config(&config),
			None => self,
		})
	}

	pub fn version(mut self, version: Version) -> Self {
		self.version = Some(version);
		self
	}

	pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.properties.insert(key.into(), value.into());
		self
	}

	pub fn properties(mut self, properties: EnvProperties) -> Self {
		self.properties.extend(properties);
		self
	}

	pub fn descriptor(mut self, descriptor: OverrideDescriptor) -> Self {
		self.descriptors.push(descriptor);
		self
	}

	pub fn descriptors(mut self, descriptors: impl IntoIterator<Item = OverrideDescriptor>) -> Self {
		self.descriptors.extend(descriptors);
		self
	}

	pub fn interceptor(mut self, handler: InterceptionHandler) -> Self {
		self.interceptors.push(handler);
		self
	}

	pub fn interceptors(mut self, handlers: impl IntoIterator<Item = InterceptionHandler>) -> Self {
		self.interceptors.extend(handlers);
		self
	}

	pub fn with_builtin_interceptors(self) -> Self {
		self.interceptors(builtin_interceptors())
	}

	pub fn model(mut self, model: TypeModel) -> Self {
		self.model = model;
		self
	}

	pub fn shadow(mut self, shadow: OverrideImpl) -> Self {
		self.catalog.register(shadow);
		self
	}

	pub fn catalog(mut self, catalog: OverrideCatalog) -> Self {
		self.catalog = catalog;
		self
	}

	pub fn picker(mut self, name: impl Into<String>, picker: impl OverridePicker + 'static) -> Self {
		self.pickers.register(name, picker);
		self
	}

	pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
		self.duplicate_policy = policy;
		self
	}

	pub fn build(self) -> Result<Environment, EnvironmentError> {
		let version = self.version.ok_or(EnvironmentError::MissingVersion)?;

		let mut builder = OverrideIndex::builder().duplicate_policy(self.duplicate_policy);
		builder.extend(self.descriptors);
		let index = builder.build()?;

		for descriptor in index.iter() {
			let shadow = self
				.catalog
				.get(&descriptor.override_type)
				.ok_or_else(|| EnvironmentError::UnknownOverride {
					name: descriptor.override_type.clone(),
					suggestion: self.catalog.suggest(&descriptor.override_type),
				})?;
			if shadow.original() != descriptor.original_type {
				return Err(EnvironmentError::MismatchedOriginal {
					override_type: descriptor.override_type.clone(),
					implemented: shadow.original().to_string(),
					registered: descriptor.original_type.clone(),
				});
			}
			if let Some(picker) = &descriptor.picker
				&& !self.pickers.contains(picker)
			{
				return Err(EnvironmentError::UnknownPicker {
					picker: picker.clone(),
					override_type: descriptor.override_type.clone(),
				});
			}
			if let Some(parent) = shadow.parent()
				&& self.catalog.get(parent).is_none()
			{
				return Err(EnvironmentError::UnknownOverride {
					name: parent.to_string(),
					suggestion: self.catalog.suggest(parent),
				});
			}
		}

		let interceptors = Arc::new(InterceptionRegistry::with_handlers(self.interceptors));
		let catalog = Arc::new(self.catalog);
		let model = Arc::new(self.model);

		let wrangler = ShadowWrangler::new(index.clone(), Arc::clone(&catalog), interceptors, Arc::clone(&model), self.pickers, version)
			.with_properties(self.properties);

		tracing::debug!(%version, overrides = index.len(), shadows = catalog.len(), "environment built");

		Ok(Environment {
			resetter: LifecycleResetter::new(index, catalog),
			direct: DirectCallProxy::new(model),
			wrangler,
		})
	}
}

/// One assembled sandbox environment.
#[derive(Debug)]
pub struct Environment {
	wrangler: ShadowWrangler,
	direct: DirectCallProxy,
	resetter: LifecycleResetter,
}

impl Environment {
	pub fn builder() -> EnvironmentBuilder {
		EnvironmentBuilder::new()
	}

	pub fn wrangler(&self) -> &ShadowWrangler {
		&self.wrangler
	}

	pub fn direct(&self) -> &DirectCallProxy {
		&self.direct
	}

	pub fn version(&self) -> Version {
		self.wrangler.version()
	}

	pub fn set_version(&self, version: Version) {
		self.wrangler.set_version(version);
	}

	pub fn set_property(&self, key: impl Into<String>, value: impl Into<String>) {
		self.wrangler.set_property(key, value);
	}

	pub fn interceptors(&self) -> &InterceptionRegistry {
		self.wrangler.interceptors()
	}

	pub fn index(&self) -> &OverrideIndex {
		self.wrangler.index()
	}

	pub fn resolve(&self, ty: &str) -> Result<Option<Resolved>, DispatchError> {
		self.wrangler.resolve(ty)
	}

	/// Dispatches a call site given as a canonical descriptor string.
	pub fn dispatch_descriptor(&self, descriptor: &str, receiver: &Value, args: &[Value]) -> Result<DispatchResult, DispatchError> {
		let identity = SignatureCache::global().parse(descriptor)?;
		self.dispatch(&identity, receiver, args)
	}

	/// Dispatches and runs a call site given as a canonical descriptor string.
	pub fn invoke(&self, descriptor: &str, receiver: &Value, args: &[Value]) -> Result<Value, DispatchError> {
		let identity = SignatureCache::global().parse(descriptor)?;
		self.invoke_identity(&identity, receiver, args)
	}

	pub fn invoke_identity(&self, identity: &OperationIdentity, receiver: &Value, args: &[Value]) -> Result<Value, DispatchError> {
		let plan = self.dispatch(identity, receiver, args)?;
		execute(&plan, &Invocation { identity, receiver, args }, &self.direct, self.version())
	}

	/// Runs an original operation, bypassing every override and interceptor.
	pub fn call_original(&self, receiver: &Value, declaring_type: &str, name: &str, args: &[Value]) -> Result<Value, DispatchError> {
		self.direct.call_original(receiver, declaring_type, name, args)
	}

	/// Resets every override active at `version` and drops cached resolutions.
	///
	/// A failing reset poisons the environment and is reported as [`DispatchError::Poisoned`].
	pub fn reset_all(&self, version: Version) -> Result<ResetReport, DispatchError> {
		if let Some(reason) = self.wrangler.poisoned() {
			return Err(DispatchError::Poisoned(reason));
		}
		match self.resetter.reset_all(version) {
			Ok(report) => {
				self.wrangler.clear_cache();
				Ok(report)
			}
			Err(error) => {
				let reason = error.to_string();
				self.wrangler.poison(reason.clone());
				Err(DispatchError::Poisoned(reason))
			}
		}
	}

	/// Resets at the current version.
	pub fn reset(&self) -> Result<ResetReport, DispatchError> {
		self.reset_all(self.version())
	}

	pub fn reset_guard(&self) -> ResetGuard<'_> {
		ResetGuard::new(self)
	}

	pub fn is_poisoned(&self) -> bool {
		self.wrangler.poisoned().is_some()
	}
}

impl Dispatcher for Environment {
	fn dispatch(&self, identity: &OperationIdentity, receiver: &Value, args: &[Value]) -> Result<DispatchResult, DispatchError> {
		self.wrangler.dispatch(identity, receiver, args)
	}
}
