use std::any::Any;
use std::cell::{Cell, Ref, RefCell};
use std::hash::Hash;
use std::rc::{Rc, Weak};

use futures::future::ready;
use futures::task::{LocalSpawn, LocalSpawnExt};
use futures::FutureExt;

use crate::batch::batch;
use crate::descriptor::Descriptor;
use crate::error::{dispatch, ErrorHandler, Rejection};
use crate::evaluation::Evaluation;
use crate::getter::{Compute, Entity, Gates, Outcome};
use crate::lazy::LazySlot;
use crate::registry::Options;
use crate::status::{PropertyState, Retrigger, Status};
use crate::var::Var;
use crate::watcher::Watcher;

/// Public handle to one async computed property: a reactive value readable
/// (and writable) like any other derived value, plus its [`Status`].
pub struct AsyncComputed<T> {
	body: Rc<dyn PropertyAccess<T>>,
}

impl<T> std::fmt::Debug for AsyncComputed<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AsyncComputed").finish_non_exhaustive()
	}
}

impl<T> Clone for AsyncComputed<T> {
	fn clone(&self) -> Self {
		AsyncComputed {
			body: self.body.clone(),
		}
	}
}

impl<T> AsyncComputed<T> {
	/// Tracked read of the committed value (or the default before the
	/// first commit). Reading a lazy property activates it.
	pub fn get<'a>(&'a self, eval: &impl AsRef<Evaluation>) -> Ref<'a, T> {
		self.body.read(eval.as_ref())
	}

	/// Untracked read; still activates a lazy property.
	pub fn get_once(&self) -> Ref<'_, T> {
		self.body.read_once()
	}

	/// Overwrite the visible value directly. The next commit replaces it.
	pub fn set(&self, value: T) {
		self.body.write(value);
	}

	pub fn status(&self) -> Status {
		self.body.status()
	}

	/// Force re-evaluation, bypassing `should_update` and the lazy gate.
	/// A no-op once the owning entity is deactivated.
	pub fn update(&self) {
		self.body.retrigger();
	}
}

pub(crate) trait PropertyAccess<T> {
	fn read<'a>(&'a self, eval: &Evaluation) -> Ref<'a, T>;
	fn read_once(&self) -> Ref<'_, T>;
	fn write(&self, value: T);
	fn status(&self) -> Status;
	fn retrigger(&self);
}

enum SlotKind<T> {
	Plain(Var<T>),
	Lazy(LazySlot<T>),
}

struct Sequence {
	/// Highest sequence number allocated for this property.
	highest: Cell<u64>,
	/// Sequence number of the last settlement that committed.
	last_applied: Cell<u64>,
}

pub(crate) struct PropertyBody<C, T>
where
	C: Entity,
	T: Hash + 'static,
{
	key: &'static str,
	context: Rc<C>,
	gates: Gates<C, T>,
	slot: SlotKind<T>,
	status: Status,
	seq: Sequence,
	debounce: bool,
	active: Rc<Cell<bool>>,
	spawner: Rc<dyn LocalSpawn>,
	handler: ErrorHandler,
	use_raw_error: bool,
	watcher: RefCell<Option<Watcher>>,
	force_next: Cell<bool>,
	this: Weak<PropertyBody<C, T>>,
}

impl<C, T> PropertyBody<C, T>
where
	C: Entity,
	T: Hash + Default + 'static,
{
	/// Build the runtime for one normalized descriptor, register its
	/// watcher and run the first invocation.
	pub fn register(
		descriptor: Descriptor<C, T>,
		context: Rc<C>,
		options: &Options,
		spawner: Rc<dyn LocalSpawn>,
		active: Rc<Cell<bool>>,
	) -> (AsyncComputed<T>, Rc<dyn Any>) {
		let Descriptor {
			key,
			get,
			default,
			watch,
			should_update,
			lazy,
			debounce,
		} = descriptor;

		let default = default.resolve(&context);
		let slot = if lazy {
			SlotKind::Lazy(LazySlot::new(default))
		} else {
			SlotKind::Plain(Var::new(default))
		};
		let lazy_gate = match &slot {
			SlotKind::Lazy(slot) => Some(slot.active().clone()),
			SlotKind::Plain(_) => None,
		};

		let body = Rc::new_cyclic(|this| PropertyBody {
			key,
			context,
			gates: Gates::new(key, get, watch, should_update, lazy_gate),
			slot,
			status: Status::new(),
			seq: Sequence {
				highest: Cell::new(0),
				last_applied: Cell::new(0),
			},
			debounce: debounce.or(options.debounce).unwrap_or(false),
			active,
			spawner,
			handler: options.error_handler.clone(),
			use_raw_error: options.use_raw_error,
			watcher: RefCell::new(None),
			force_next: Cell::new(false),
			this: this.clone(),
		});

		body.status.bind(Rc::downgrade(&body) as Weak<dyn Retrigger>);

		let watcher = Watcher::with_name(key, {
			let weak = Rc::downgrade(&body);
			Box::new(move |eval| {
				if let Some(body) = weak.upgrade() {
					body.evaluate(eval);
				}
			})
		});
		*body.watcher.borrow_mut() = Some(watcher.clone());
		watcher.prime();

		let handle = AsyncComputed {
			body: body.clone() as Rc<dyn PropertyAccess<T>>,
		};
		(handle, body as Rc<dyn Any>)
	}

	fn evaluate(&self, eval: &Evaluation) {
		let outcome = if self.force_next.take() {
			self.gates.track(&self.context, eval);
			Outcome::Recomputed(self.gates.force(&self.context, eval))
		} else {
			self.gates.invoke(&self.context, eval)
		};
		self.sequence(outcome);
	}

	/// Allocate a sequence number for one invocation, normalize its output
	/// into a future and schedule the settlement continuation. Allocation
	/// happens synchronously, before any suspension, so re-entrant
	/// triggers always observe consistent bookkeeping.
	fn sequence(&self, outcome: Outcome<T>) {
		let compute = match outcome {
			Outcome::Skipped => return,
			Outcome::Recomputed(compute) => compute,
		};

		if self.debounce && self.seq.highest.get() > self.seq.last_applied.get() {
			tracing::debug!(key = self.key, "debounce: trigger coalesced while a computation is pending");
			return;
		}

		let seq = self.seq.highest.get() + 1;
		self.seq.highest.set(seq);

		let future = match compute {
			Compute::Ready(value) => ready(Ok(value)).boxed_local(),
			Compute::Deferred(future) => future,
		};

		self.status.transition(PropertyState::Updating);

		let this = self.this.clone();
		let task = async move {
			let result = future.await;
			if let Some(body) = this.upgrade() {
				batch(|| body.settle(seq, result));
			}
		};
		if self.spawner.spawn_local(task).is_err() {
			tracing::debug!(key = self.key, seq, "executor is gone; dropping computation");
		}
	}

	/// Apply one settlement, unless a newer invocation superseded it.
	fn settle(&self, seq: u64, result: Result<T, Rejection>) {
		let eligible = if self.debounce {
			seq > self.seq.last_applied.get()
		} else {
			seq == self.seq.highest.get()
		};
		if !eligible {
			tracing::debug!(key = self.key, seq, "stale settlement discarded");
			return;
		}
		self.seq.last_applied.set(seq);
		match result {
			Ok(value) => {
				match &self.slot {
					SlotKind::Plain(var) => var.set(value),
					SlotKind::Lazy(slot) => slot.write(value),
				}
				self.status.succeed();
			}
			Err(err) => {
				self.status.fail(err.clone());
				dispatch(self.key, &self.handler, self.use_raw_error, &err);
			}
		}
	}
}

impl<C, T> PropertyAccess<T> for PropertyBody<C, T>
where
	C: Entity,
	T: Hash + Default + 'static,
{
	fn read<'a>(&'a self, eval: &Evaluation) -> Ref<'a, T> {
		match &self.slot {
			SlotKind::Plain(var) => var.get(eval),
			SlotKind::Lazy(slot) => slot.read(eval),
		}
	}

	fn read_once(&self) -> Ref<'_, T> {
		match &self.slot {
			SlotKind::Plain(var) => var.get_once(),
			SlotKind::Lazy(slot) => slot.read_once(),
		}
	}

	fn write(&self, value: T) {
		match &self.slot {
			SlotKind::Plain(var) => var.set(value),
			SlotKind::Lazy(slot) => slot.write_through(value),
		}
	}

	fn status(&self) -> Status {
		self.status.clone()
	}

	fn retrigger(&self) {
		if !self.active.get() {
			tracing::debug!(key = self.key, "update() after teardown ignored");
			return;
		}
		let watcher = self.watcher.borrow().clone();
		if let Some(watcher) = watcher {
			batch(|| {
				self.force_next.set(true);
				watcher.prime();
			});
		}
	}
}

impl<C, T> Retrigger for PropertyBody<C, T>
where
	C: Entity,
	T: Hash + Default + 'static,
{
	fn retrigger(&self) {
		PropertyAccess::retrigger(self);
	}
}
