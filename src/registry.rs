use std::any::Any;
use std::cell::Cell;
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

use futures::task::LocalSpawn;
use smallvec::SmallVec;

use crate::descriptor::Declaration;
use crate::error::{ConfigError, ErrorHandler};
use crate::getter::Entity;
use crate::sequencer::{AsyncComputed, PropertyBody};
use crate::status::Status;

/// Registry-wide configuration, shared by every declared property.
#[derive(Clone, Default, Debug)]
pub struct Options {
	pub error_handler: ErrorHandler,
	/// Pass the raw rejection value to the handler instead of its
	/// rendered message chain.
	pub use_raw_error: bool,
	/// Default debounce policy; a per-property `debounce` overrides it.
	pub debounce: Option<bool>,
}

/// The per-entity table of async computed properties. Owns every property
/// runtime and the parallel status map; dropping the registry (together
/// with any outstanding handles) tears the subscriptions down.
pub struct Registry<C: Entity> {
	context: Rc<C>,
	options: Options,
	spawner: Rc<dyn LocalSpawn>,
	active: Rc<Cell<bool>>,
	statuses: HashMap<&'static str, Status>,
	properties: SmallVec<[Rc<dyn Any>; 4]>,
}

impl<C: Entity> Registry<C> {
	pub fn new(context: Rc<C>, spawner: Rc<dyn LocalSpawn>) -> Self {
		Self::with_options(context, spawner, Options::default())
	}

	pub fn with_options(context: Rc<C>, spawner: Rc<dyn LocalSpawn>, options: Options) -> Self {
		Registry {
			context,
			options,
			spawner,
			active: Rc::new(Cell::new(true)),
			statuses: HashMap::new(),
			properties: SmallVec::new(),
		}
	}

	pub fn context(&self) -> &Rc<C> {
		&self.context
	}

	/// Declare one property. The composed getter runs once immediately;
	/// the visible value starts at the resolved default.
	pub fn declare<T>(
		&mut self,
		key: &'static str,
		declaration: impl Into<Declaration<C, T>>,
	) -> Result<AsyncComputed<T>, ConfigError>
	where
		T: Hash + Default + 'static,
	{
		if self.statuses.contains_key(key) {
			return Err(ConfigError::DuplicateKey { key });
		}
		let descriptor = declaration.into().normalize(key)?;
		let (handle, body) = PropertyBody::register(
			descriptor,
			self.context.clone(),
			&self.options,
			self.spawner.clone(),
			self.active.clone(),
		);
		self.statuses.insert(key, handle.status());
		self.properties.push(body);
		Ok(handle)
	}

	/// The read-only status map entry for `key`.
	pub fn status(&self, key: &str) -> Option<Status> {
		self.statuses.get(key).cloned()
	}

	pub fn is_active(&self) -> bool {
		self.active.get()
	}

	/// Host teardown signal: manual updates become no-ops. Settlements
	/// already scheduled still run; they only write state nobody observes.
	pub fn deactivate(&self) {
		self.active.set(false);
	}
}
