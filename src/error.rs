use std::error::Error;
use std::rc::Rc;

use thiserror::Error as ThisError;

/// The raw rejection value of a failed computation, stored and reported
/// unwrapped.
pub type Rejection = Rc<dyn Error>;

/// Malformed property declaration. Fatal at declare time; never routed
/// through the error handler.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	#[error("async computed property `{key}` is already declared")]
	DuplicateKey { key: &'static str },
	#[error("async computed property `{key}` has an empty watch path")]
	EmptyWatchPath { key: &'static str },
	#[error("watch path `{path}` of `{key}` has an empty segment")]
	EmptyWatchSegment { key: &'static str, path: String },
}

/// Failure to mark a dotted watch path as a dependency.
#[derive(Debug, ThisError)]
pub enum TouchError {
	#[error("entity exposes no dependency at `{path}`")]
	Unsupported { path: String },
	#[error("dependency path `{path}` cannot be traversed: {reason}")]
	BadPath { path: String, reason: String },
}

/// What a rejection handler receives, depending on the `use_raw_error`
/// option: the rejection value itself, or its rendered message chain.
#[derive(Debug, Clone)]
pub enum Reported {
	Raw(Rejection),
	Text(String),
}

impl Reported {
	pub fn text(&self) -> Option<&str> {
		match self {
			Reported::Text(text) => Some(text),
			Reported::Raw(_) => None,
		}
	}

	pub fn raw(&self) -> Option<&Rejection> {
		match self {
			Reported::Raw(err) => Some(err),
			Reported::Text(_) => None,
		}
	}
}

#[derive(Clone, Default)]
pub enum ErrorHandler {
	/// Log through `tracing::error!`.
	#[default]
	Default,
	/// Swallow rejections entirely.
	Disabled,
	Custom(Rc<dyn Fn(&Reported)>),
}

impl std::fmt::Debug for ErrorHandler {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ErrorHandler::Default => f.write_str("Default"),
			ErrorHandler::Disabled => f.write_str("Disabled"),
			ErrorHandler::Custom(_) => f.write_str("Custom(..)"),
		}
	}
}

/// Route a non-stale rejection to the configured handler. Never rethrows.
pub(crate) fn dispatch(
	key: &'static str,
	handler: &ErrorHandler,
	use_raw_error: bool,
	err: &Rejection,
) {
	match handler {
		ErrorHandler::Disabled => {}
		ErrorHandler::Default => {
			tracing::error!(key, error = %render(err.as_ref()), "error evaluating async computed property");
		}
		ErrorHandler::Custom(func) => {
			let reported = if use_raw_error {
				Reported::Raw(err.clone())
			} else {
				Reported::Text(render(err.as_ref()))
			};
			func(&reported);
		}
	}
}

/// Message plus source chain, the closest analogue of a stack rendering.
fn render(err: &dyn Error) -> String {
	let mut out = err.to_string();
	let mut source = err.source();
	while let Some(cause) = source {
		out.push_str("\ncaused by: ");
		out.push_str(&cause.to_string());
		source = cause.source();
	}
	out
}
