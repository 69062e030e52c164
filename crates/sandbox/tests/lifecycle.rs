//! Lifecycle reset, poisoning and environment assembly.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use umbra_sandbox::{DispatchError, Environment, EnvironmentBuilder, EnvironmentError, EnvironmentProvider, InterceptionHandler, OverrideImpl, OverrideOp, Value};
use umbra_shadow_map::{OverrideDescriptor, PropertyPicker, Version, VersionRange};

type ResetLog = Arc<Mutex<Vec<String>>>;

/// Override whose `prepare` bumps a counter and whose reset hook clears it and logs.
fn stateful(name: &'static str, original: &str, log: &ResetLog) -> (OverrideImpl, Arc<AtomicUsize>) {
	let state = Arc::new(AtomicUsize::new(0));
	let bump = Arc::clone(&state);
	let clear = Arc::clone(&state);
	let log = Arc::clone(log);
	let shadow = OverrideImpl::new(name, original)
		.op(OverrideOp::new("prepare", &[], "void", move |_| {
			bump.fetch_add(1, Ordering::SeqCst);
			Ok(Value::Void)
		}))
		.on_reset(move || {
			clear.store(0, Ordering::SeqCst);
			log.lock().push(name.to_string());
			Ok(())
		});
	(shadow, state)
}

struct Fixture {
	env: Environment,
	log: ResetLog,
	looper_state: Arc<AtomicUsize>,
	legacy_state: Arc<AtomicUsize>,
}

fn fixture(version: u32) -> Fixture {
	let log = ResetLog::default();
	let (looper, looper_state) = stateful("ShadowLooper", "app.Looper", &log);
	let (legacy, legacy_state) = stateful("ShadowLegacyLooper", "app.Looper", &log);
	let (toast, _) = stateful("ShadowToast", "app.Toast", &log);

	let env = Environment::builder()
		.version(Version(version))
		.shadow(looper)
		.shadow(legacy)
		.shadow(toast)
		.shadow(OverrideImpl::new("ShadowView", "app.View"))
		.descriptor(OverrideDescriptor::new("ShadowToast", "app.Toast").with_range(VersionRange::at_least(21)))
		.descriptor(OverrideDescriptor::new("ShadowLooper", "app.Looper").with_range(VersionRange::at_least(21)))
		.descriptor(OverrideDescriptor::new("ShadowLegacyLooper", "app.Looper").with_range(VersionRange::at_most(20)))
		.descriptor(OverrideDescriptor::new("ShadowView", "app.View"))
		.build()
		.unwrap();

	Fixture {
		env,
		log,
		looper_state,
		legacy_state,
	}
}

#[test]
fn reset_clears_every_active_override_and_skips_inactive_ones() {
	let f = fixture(30);
	f.env.invoke("app.Looper/prepare()V", &Value::Null, &[]).unwrap();
	f.env.invoke("app.Looper/prepare()V", &Value::Null, &[]).unwrap();
	assert_eq!(f.looper_state.load(Ordering::SeqCst), 2);
	f.legacy_state.store(9, Ordering::SeqCst);

	let report = f.env.reset_all(Version(30)).unwrap();
	assert_eq!(report.reset, ["ShadowLooper", "ShadowToast"]);
	assert_eq!(*f.log.lock(), ["ShadowLooper", "ShadowToast"]);
	assert_eq!(f.looper_state.load(Ordering::SeqCst), 0);
	assert_eq!(f.legacy_state.load(Ordering::SeqCst), 9, "out-of-range override must not reset");
}

#[test]
fn reset_follows_the_requested_version() {
	let f = fixture(30);
	let report = f.env.reset_all(Version(19)).unwrap();
	assert_eq!(report.version, Version(19));
	assert_eq!(report.reset, ["ShadowLegacyLooper"]);
}

#[test]
fn reset_guard_runs_when_a_test_panics() {
	let f = fixture(30);
	let outcome = catch_unwind(AssertUnwindSafe(|| {
		let _guard = f.env.reset_guard();
		f.env.invoke("app.Looper/prepare()V", &Value::Null, &[]).unwrap();
		panic!("test body failed");
	}));
	assert!(outcome.is_err());
	assert_eq!(f.looper_state.load(Ordering::SeqCst), 0);
	assert_eq!(*f.log.lock(), ["ShadowLooper", "ShadowToast"]);
}

#[test]
fn failed_reset_poisons_the_environment() {
	let attempts = Arc::new(AtomicUsize::new(0));
	let counted = Arc::clone(&attempts);
	let env = Environment::builder()
		.version(Version(30))
		.shadow(
			OverrideImpl::new("ShadowBroken", "app.Broken")
				.op(OverrideOp::new("ping", &[], "int", |_| Ok(Value::Int(1))))
				.on_reset(move || {
					counted.fetch_add(1, Ordering::SeqCst);
					Err("listener still registered".into())
				}),
		)
		.descriptor(OverrideDescriptor::new("ShadowBroken", "app.Broken"))
		.build()
		.unwrap();

	assert_eq!(env.invoke("app.Broken/ping()I", &Value::Null, &[]).unwrap(), Value::Int(1));

	let Err(DispatchError::Poisoned(reason)) = env.reset() else {
		panic!("reset should poison");
	};
	assert!(reason.contains("ShadowBroken"), "{reason}");
	assert!(env.is_poisoned());
	assert!(matches!(env.invoke("app.Broken/ping()I", &Value::Null, &[]), Err(DispatchError::Poisoned(_))));
	assert!(matches!(env.reset(), Err(DispatchError::Poisoned(_))));
	assert_eq!(attempts.load(Ordering::SeqCst), 1, "failed resets are not retried");
}

fn looper_env(builder: EnvironmentBuilder) -> Result<Environment, EnvironmentError> {
	let looper = |name: &'static str| OverrideImpl::new(name, "android.os.Looper").op(OverrideOp::new("mode", &[], "java.lang.String", move |_| Ok(Value::str(name))));
	builder
		.shadow(looper("ShadowPausedLooper"))
		.shadow(looper("ShadowLegacyLooper"))
		.picker("LooperPicker", PropertyPicker::new("looper-mode", [("paused", "ShadowPausedLooper"), ("legacy", "ShadowLegacyLooper")]))
		.build()
}

#[test]
fn environment_from_config_directory() {
	let dir = tempfile::tempdir().unwrap();
	std::fs::write(
		dir.path().join("umbra.toml"),
		r#"
		[environment]
		version = 30
		[environment.properties]
		looper-mode = "paused"

		[[override]]
		type = "ShadowPausedLooper"
		original = "android.os.Looper"
		picker = "LooperPicker"
		"#,
	)
	.unwrap();
	std::fs::create_dir(dir.path().join("overrides.d")).unwrap();
	std::fs::write(
		dir.path().join("overrides.d").join("10-legacy.toml"),
		"[[override]]\ntype = \"ShadowLegacyLooper\"\noriginal = \"android.os.Looper\"\npicker = \"LooperPicker\"\n",
	)
	.unwrap();

	let env = looper_env(Environment::builder().config_dir(dir.path()).unwrap()).unwrap();
	assert_eq!(env.version(), Version(30));
	assert_eq!(env.invoke("android.os.Looper/mode()Ljava/lang/String;", &Value::Null, &[]).unwrap(), Value::str("ShadowPausedLooper"));

	env.set_property("looper-mode", "legacy");
	assert_eq!(env.invoke("android.os.Looper/mode()Ljava/lang/String;", &Value::Null, &[]).unwrap(), Value::str("ShadowLegacyLooper"));
}

#[test]
fn broken_config_layers_fail_the_build() {
	let dir = tempfile::tempdir().unwrap();
	std::fs::write(dir.path().join("umbra.toml"), "[environment\nversion = 30\n").unwrap();
	assert!(matches!(Environment::builder().config_dir(dir.path()), Err(EnvironmentError::Config(errors)) if errors.len() == 1));
}

#[test]
fn configuration_mistakes_surface_at_build() {
	let unknown = looper_env(Environment::builder().version(Version(30)).descriptor(OverrideDescriptor::new("ShadowPausedLoper", "android.os.Looper")));
	match unknown {
		Err(EnvironmentError::UnknownOverride { name, suggestion }) => {
			assert_eq!(name, "ShadowPausedLoper");
			assert_eq!(suggestion.as_deref(), Some("ShadowPausedLooper"));
		}
		other => panic!("expected unknown override, got {other:?}"),
	}

	let picker = looper_env(
		Environment::builder()
			.version(Version(30))
			.descriptor(OverrideDescriptor::new("ShadowPausedLooper", "android.os.Looper").with_picker("Missing")),
	);
	assert!(matches!(picker, Err(EnvironmentError::UnknownPicker { .. })));

	let mismatched = looper_env(Environment::builder().version(Version(30)).descriptor(OverrideDescriptor::new("ShadowPausedLooper", "android.os.Handler")));
	assert!(matches!(mismatched, Err(EnvironmentError::MismatchedOriginal { .. })));

	assert!(matches!(looper_env(Environment::builder()), Err(EnvironmentError::MissingVersion)));
}

struct StaticProvider;

impl EnvironmentProvider for StaticProvider {
	fn current_version(&self) -> Version {
		Version(33)
	}

	fn registered_overrides(&self) -> Vec<OverrideDescriptor> {
		vec![OverrideDescriptor::new("ShadowPausedLooper", "android.os.Looper")]
	}

	fn configured_interceptors(&self) -> Vec<InterceptionHandler> {
		vec![InterceptionHandler::named("android.os.SystemClock", "uptimeMillis", |_| Ok(Value::Long(1_000)))]
	}
}

#[test]
fn environment_from_provider() {
	let env = looper_env(EnvironmentBuilder::from_provider(&StaticProvider)).unwrap();
	assert_eq!(env.version(), Version(33));
	assert_eq!(env.invoke("android.os.SystemClock/uptimeMillis()J", &Value::Null, &[]).unwrap(), Value::Long(1_000));
	assert_eq!(env.invoke("android.os.Looper/mode()Ljava/lang/String;", &Value::Null, &[]).unwrap(), Value::str("ShadowPausedLooper"));
}
