use std::cell::Ref;
use std::hash::Hash;

use crate::batch::batch;
use crate::evaluation::Evaluation;
use crate::var::Var;

/// Shadow storage for a lazy property: the real getter stays suppressed
/// until the first read flips the activation cell. Activation is
/// monotonic; nothing ever deactivates a slot.
pub(crate) struct LazySlot<T> {
	active: Var<bool>,
	shadow: Var<T>,
}

impl<T> LazySlot<T>
where
	T: Hash + 'static,
{
	pub fn new(default: T) -> Self {
		LazySlot {
			active: Var::new(false),
			shadow: Var::new(default),
		}
	}

	pub fn active(&self) -> &Var<bool> {
		&self.active
	}

	pub fn is_active(&self) -> bool {
		*self.active.get_once()
	}

	fn activate(&self) {
		if !self.is_active() {
			batch(|| self.active.set(true));
		}
	}

	/// Tracked read. The first read serves the default and activates,
	/// which lets the next recomputation cycle reach the real getter.
	pub fn read<'a>(&'a self, eval: &Evaluation) -> Ref<'a, T> {
		self.activate();
		self.shadow.get(eval)
	}

	/// Untracked read; still counts as a read for activation.
	pub fn read_once(&self) -> Ref<'_, T> {
		self.activate();
		self.shadow.get_once()
	}

	/// Commit a value: notify subscribers when active, silently otherwise.
	pub fn write(&self, value: T) {
		if self.is_active() {
			self.shadow.set(value);
		} else {
			self.shadow.set_silent(value);
		}
	}

	/// Direct write requested by user code; always notifies.
	pub fn write_through(&self, value: T) {
		self.shadow.set(value);
	}
}
