//! End-to-end dispatch behavior through an assembled environment.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;
use umbra_sandbox::{
	DirectCallProxy, DispatchError, DispatchResult, Dispatcher, Environment, Invocation, MapKey, OriginalType, OverrideImpl, OverrideOp,
	ShadowWrangler, TypeModel, Value, invoke,
};
use umbra_shadow_map::{OverrideDescriptor, Version, VersionRange};
use umbra_signature::OperationIdentity;

const ELDEST: &str = "java.util.LinkedHashMap/eldest()Ljava.lang.Object;";

fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn view_model() -> TypeModel {
	TypeModel::new()
		.with_type(
			OriginalType::new("app.View")
				.safe("getId", &[], "int", |_| Ok(Value::Int(1)))
				.safe("describe", &[], "java.lang.String", |_| Ok(Value::str("view")))
				.unsafe_op("nativeCreate", &[], "long"),
		)
		.with_type(OriginalType::new("app.TextView").extends("app.View"))
		.with_type(OriginalType::new("app.EditText").extends("app.TextView"))
}

fn describing(label: &'static str) -> OverrideOp {
	OverrideOp::new("describe", &[], "java.lang.String", move |_| Ok(Value::str(label)))
}

#[test]
fn most_specific_override_wins() {
	init_tracing();
	let env = Environment::builder()
		.version(Version(30))
		.model(view_model())
		.shadow(OverrideImpl::new("ShadowView", "app.View").op(describing("shadow-view")))
		.shadow(OverrideImpl::new("ShadowTextView", "app.TextView").op(describing("shadow-text-view")))
		.descriptor(OverrideDescriptor::new("ShadowView", "app.View"))
		.descriptor(OverrideDescriptor::new("ShadowTextView", "app.TextView"))
		.build()
		.unwrap();

	let edit_text = Value::object("app.EditText");
	assert_eq!(env.invoke("app.EditText/describe()Ljava/lang/String;", &edit_text, &[]).unwrap(), Value::str("shadow-text-view"));
	assert_eq!(env.invoke("app.View/describe()Ljava/lang/String;", &edit_text, &[]).unwrap(), Value::str("shadow-text-view"));
	assert_eq!(
		env.invoke("app.View/describe()Ljava/lang/String;", &Value::object("app.View"), &[]).unwrap(),
		Value::str("shadow-view")
	);
}

#[test]
fn version_ranges_partition_overrides() {
	let env = Environment::builder()
		.version(Version(5))
		.model(view_model())
		.shadow(OverrideImpl::new("ShadowOldView", "app.View").op(describing("old")))
		.shadow(OverrideImpl::new("ShadowNewView", "app.View").op(describing("new")))
		.descriptor(OverrideDescriptor::new("ShadowOldView", "app.View").with_range(VersionRange::between(1, 5)))
		.descriptor(OverrideDescriptor::new("ShadowNewView", "app.View").with_range(VersionRange::between(6, 10)))
		.build()
		.unwrap();

	let describe = || env.invoke("app.View/describe()Ljava/lang/String;", &Value::Null, &[]).unwrap();
	assert_eq!(describe(), Value::str("old"));
	env.set_version(Version(6));
	assert_eq!(describe(), Value::str("new"));
	env.set_version(Version(11));
	assert_eq!(describe(), Value::str("view"));
}

/// Counts every dispatch it forwards.
struct CountingDispatcher<'a> {
	inner: &'a ShadowWrangler,
	calls: AtomicUsize,
}

impl Dispatcher for CountingDispatcher<'_> {
	fn dispatch(&self, identity: &OperationIdentity, receiver: &Value, args: &[Value]) -> Result<DispatchResult, DispatchError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.inner.dispatch(identity, receiver, args)
	}
}

#[test]
fn calling_the_original_never_re_enters_dispatch() {
	let original_runs = Arc::new(AtomicUsize::new(0));
	let runs = Arc::clone(&original_runs);
	let model = TypeModel::new().with_type(OriginalType::new("app.View").safe("getId", &[], "int", move |_| {
		runs.fetch_add(1, Ordering::SeqCst);
		Ok(Value::Int(7))
	}));

	let decorating = OverrideOp::new("getId", &[], "int", |call| match call.call_original(call.args)? {
		Value::Int(id) => Ok(Value::Int(id * 100)),
		other => Ok(other),
	});
	let env = Environment::builder()
		.version(Version(30))
		.model(model)
		.shadow(OverrideImpl::new("ShadowView", "app.View").op(decorating))
		.descriptor(OverrideDescriptor::new("ShadowView", "app.View"))
		.build()
		.unwrap();

	let counting = CountingDispatcher {
		inner: env.wrangler(),
		calls: AtomicUsize::new(0),
	};
	let identity = OperationIdentity::parse("app.View/getId()I").unwrap();
	let invocation = Invocation {
		identity: &identity,
		receiver: &Value::object("app.View"),
		args: &[],
	};

	let result = invoke(&counting, &invocation, env.direct(), env.version()).unwrap();
	assert_eq!(result, Value::Int(700));
	assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
	assert_eq!(original_runs.load(Ordering::SeqCst), 1);

	// Verification code bypasses the override entirely.
	let direct: &DirectCallProxy = env.direct();
	assert_eq!(direct.call_original(&Value::Null, "app.View", "getId", &[]).unwrap(), Value::Int(7));
	assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn partial_override_never_errors_for_missing_operations() {
	let env = Environment::builder()
		.version(Version(30))
		.model(view_model())
		.with_builtin_interceptors()
		.shadow(OverrideImpl::new("ShadowView", "app.View").op(describing("shadow")))
		.descriptor(OverrideDescriptor::new("ShadowView", "app.View"))
		.build()
		.unwrap();

	assert!(matches!(env.dispatch_descriptor("app.View/getId()I", &Value::Null, &[]).unwrap(), DispatchResult::RunOriginal));
	assert_eq!(env.invoke("app.View/getId()I", &Value::Null, &[]).unwrap(), Value::Int(1));
	assert_eq!(env.invoke("app.View/nativeCreate()J", &Value::Null, &[]).unwrap(), Value::Long(0));
	assert!(matches!(
		env.dispatch_descriptor("java.lang.System/loadLibrary(Ljava/lang/String;)V", &Value::Null, &[]).unwrap(),
		DispatchResult::RunIntercepted(_)
	));
}

#[test]
fn linked_hash_map_eldest_is_intercepted() {
	let env = Environment::builder().version(Version(30)).with_builtin_interceptors().build().unwrap();

	let empty = Value::linked_map([]);
	assert!(matches!(env.dispatch_descriptor(ELDEST, &empty, &[]).unwrap(), DispatchResult::RunIntercepted(_)));
	assert_eq!(env.invoke(ELDEST, &empty, &[]).unwrap(), Value::Null);

	let map = Value::linked_map([(MapKey::from(1), Value::str("first")), (MapKey::from(2), Value::str("second"))]);
	let eldest = env.invoke(ELDEST, &map, &[]).unwrap();
	let (key, value) = eldest.as_entry().expect("eldest should be an entry");
	assert_eq!(key, &Value::Int(1));
	assert_eq!(value, &Value::str("first"));
}

#[test]
fn malformed_descriptors_are_rejected() {
	let env = Environment::builder().version(Version(30)).build().unwrap();
	assert!(matches!(env.invoke("app.View/getId()Ix", &Value::Null, &[]), Err(DispatchError::Signature(_))));
}
