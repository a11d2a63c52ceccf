use std::rc::Rc;

use crate::error::ConfigError;
use crate::evaluation::Evaluation;
use crate::getter::{Compute, Getter, Predicate};

/// Reactive dependencies to touch before the getter runs: a side-effecting
/// function, or dotted paths resolved through [`crate::Entity::touch`].
pub enum Watch<C> {
	Touch(Rc<dyn Fn(&C, &Evaluation)>),
	Paths(Vec<String>),
}

/// Placeholder served until the first commit.
pub enum DefaultValue<C, T> {
	/// Fall back to `T::default()`.
	Unset,
	Value(T),
	/// Produced per entity, with the owning entity as context.
	Func(Rc<dyn Fn(&C) -> T>),
}

impl<C, T> DefaultValue<C, T> {
	pub(crate) fn resolve(self, ctx: &C) -> T
	where
		T: Default,
	{
		match self {
			DefaultValue::Unset => T::default(),
			DefaultValue::Value(value) => value,
			DefaultValue::Func(func) => func(ctx),
		}
	}
}

/// A raw property declaration: a bare getter, or a full specification.
pub enum Declaration<C, T> {
	Getter(Getter<C, T>),
	Spec(PropertySpec<C, T>),
}

impl<C, T> Declaration<C, T> {
	pub fn getter(get: impl Fn(&C, &Evaluation) -> Compute<T> + 'static) -> Self {
		Declaration::Getter(Rc::new(get))
	}

	/// Normalize into the canonical descriptor; downstream code never
	/// re-inspects the raw declaration shape.
	pub(crate) fn normalize(self, key: &'static str) -> Result<Descriptor<C, T>, ConfigError> {
		let spec = match self {
			Declaration::Getter(get) => PropertySpec::new_getter(get),
			Declaration::Spec(spec) => spec,
		};
		if let Some(Watch::Paths(paths)) = &spec.watch {
			validate_paths(key, paths)?;
		}
		Ok(Descriptor {
			key,
			get: spec.get,
			default: spec.default,
			watch: spec.watch,
			should_update: spec.should_update,
			lazy: spec.lazy,
			debounce: spec.debounce,
		})
	}
}

impl<C, T> From<PropertySpec<C, T>> for Declaration<C, T> {
	fn from(spec: PropertySpec<C, T>) -> Self {
		Declaration::Spec(spec)
	}
}

fn validate_paths(key: &'static str, paths: &[String]) -> Result<(), ConfigError> {
	for path in paths {
		if path.is_empty() {
			return Err(ConfigError::EmptyWatchPath { key });
		}
		if path.split('.').any(|segment| segment.is_empty()) {
			return Err(ConfigError::EmptyWatchSegment {
				key,
				path: path.clone(),
			});
		}
	}
	Ok(())
}

/// Full property specification, built fluently:
///
/// ```ignore
/// PropertySpec::new(|doc: &Doc, ev| Compute::ready(doc.title.get(ev).len()))
///     .default_value(0)
///     .watch_paths(["meta.revision"])
///     .lazy()
/// ```
pub struct PropertySpec<C, T> {
	pub(crate) get: Getter<C, T>,
	pub(crate) default: DefaultValue<C, T>,
	pub(crate) watch: Option<Watch<C>>,
	pub(crate) should_update: Option<Predicate<C>>,
	pub(crate) lazy: bool,
	pub(crate) debounce: Option<bool>,
}

impl<C, T> PropertySpec<C, T> {
	pub fn new(get: impl Fn(&C, &Evaluation) -> Compute<T> + 'static) -> Self {
		Self::new_getter(Rc::new(get))
	}

	fn new_getter(get: Getter<C, T>) -> Self {
		PropertySpec {
			get,
			default: DefaultValue::Unset,
			watch: None,
			should_update: None,
			lazy: false,
			debounce: None,
		}
	}

	pub fn default_value(mut self, value: T) -> Self {
		self.default = DefaultValue::Value(value);
		self
	}

	pub fn default_with(mut self, func: impl Fn(&C) -> T + 'static) -> Self {
		self.default = DefaultValue::Func(Rc::new(func));
		self
	}

	pub fn watch(mut self, func: impl Fn(&C, &Evaluation) + 'static) -> Self {
		self.watch = Some(Watch::Touch(Rc::new(func)));
		self
	}

	pub fn watch_paths<I, S>(mut self, paths: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.watch = Some(Watch::Paths(paths.into_iter().map(Into::into).collect()));
		self
	}

	pub fn should_update(mut self, func: impl Fn(&C, &Evaluation) -> bool + 'static) -> Self {
		self.should_update = Some(Rc::new(func));
		self
	}

	pub fn lazy(mut self) -> Self {
		self.lazy = true;
		self
	}

	pub fn debounce(mut self, on: bool) -> Self {
		self.debounce = Some(on);
		self
	}
}

/// Canonical per-property descriptor produced by normalization.
pub struct Descriptor<C, T> {
	pub(crate) key: &'static str,
	pub(crate) get: Getter<C, T>,
	pub(crate) default: DefaultValue<C, T>,
	pub(crate) watch: Option<Watch<C>>,
	pub(crate) should_update: Option<Predicate<C>>,
	pub(crate) lazy: bool,
	pub(crate) debounce: Option<bool>,
}
