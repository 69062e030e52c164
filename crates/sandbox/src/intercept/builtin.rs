//! Interceptors every sandbox starts with.

use super::{InterceptCall, InterceptKey, InterceptionHandler};
use crate::error::DispatchError;
use crate::value::Value;

/// Operations that are skipped outright, keyed by owner and name.
const NO_OP_OPERATIONS: &[(&str, &str)] = &[
	("java.lang.System", "loadLibrary"),
	("android.os.StrictMode", "trackActivity"),
	("android.os.StrictMode", "incrementExpectedActivityCount"),
	("android.util.LocaleUtil", "getLayoutDirectionFromLocale"),
];

/// Types whose every operation is skipped.
const NO_OP_TYPES: &[&str] = &["android.view.FallbackEventHandler", "android.view.IWindowSession"];

pub fn builtin_interceptors() -> Vec<InterceptionHandler> {
	let mut handlers = vec![
		InterceptionHandler::named("java.util.LinkedHashMap", "eldest", linked_hash_map_eldest),
		InterceptionHandler::named("java.util.Locale", "adjustLanguageCode", locale_adjust_language_code),
		InterceptionHandler::named("java.lang.System", "logE", |call| system_log(call, tracing::Level::ERROR)),
		InterceptionHandler::named("java.lang.System", "logW", |call| system_log(call, tracing::Level::WARN)),
		InterceptionHandler::named("java.net.Socket", "getFileDescriptor$", |_| Ok(Value::Null)),
	];

	handlers.extend(NO_OP_OPERATIONS.iter().map(|(owner, name)| {
		InterceptionHandler::no_op(InterceptKey::Named {
			owner: owner.to_string(),
			name: name.to_string(),
		})
	}));
	handlers.extend(NO_OP_TYPES.iter().map(|owner| InterceptionHandler::no_op(InterceptKey::Owner(owner.to_string()))));

	handlers
}

/// Oldest entry of an insertion-ordered map, or `null` when it is empty.
fn linked_hash_map_eldest(call: &InterceptCall<'_>) -> Result<Value, DispatchError> {
	let Some(map) = call.receiver.as_map() else {
		return Err(DispatchError::raised(call.identity, "receiver is not a map"));
	};
	Ok(map
		.lock()
		.first()
		.map_or(Value::Null, |(key, value)| Value::entry(key.to_value(), value.clone())))
}

fn locale_adjust_language_code(call: &InterceptCall<'_>) -> Result<Value, DispatchError> {
	let Some(code) = call.arg(0)?.as_str() else {
		return Ok(Value::Null);
	};
	let lowered = code.to_lowercase();
	let adjusted = match lowered.as_str() {
		"he" => "iw",
		"id" => "in",
		"yi" => "ji",
		other => other,
	};
	Ok(Value::str(adjusted))
}

fn system_log(call: &InterceptCall<'_>, level: tracing::Level) -> Result<Value, DispatchError> {
	let message = call
		.args
		.iter()
		.map(|arg| match arg {
			Value::Str(s) => s.to_string(),
			other => format!("{other:?}"),
		})
		.collect::<Vec<_>>()
		.join(" ");
	if level == tracing::Level::ERROR {
		tracing::error!(target: "umbra::system", "{message}");
	} else {
		tracing::warn!(target: "umbra::system", "{message}");
	}
	Ok(Value::Void)
}
