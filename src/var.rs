use std::cell::{Ref, RefCell};
use std::collections::BTreeSet;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::{Rc, Weak};

use crate::addr::WeakKey;
use crate::evaluation::Evaluation;
use crate::{Derived, Invalid, Observable, Version};

/// A reactive cell. Reads through an [`Evaluation`] register a dependency;
/// writes invalidate every registered reader when the value actually
/// changed (decided by value hash, so writing an equal value is a no-op).
pub struct Var<T> {
	body: Rc<VarBody<T>>,
}

impl<T> Clone for Var<T> {
	fn clone(&self) -> Self {
		Var {
			body: self.body.clone(),
		}
	}
}

struct Slot<T> {
	value: T,
	hash: u64,
}

impl<T: Hash> Slot<T> {
	fn new(value: T) -> Self {
		let hash = fxhash::hash64(&value);
		Slot { value, hash }
	}
}

pub struct VarBody<T> {
	slot: RefCell<Slot<T>>,
	inner: RefCell<VarInner<T>>,
}

struct VarInner<T> {
	used_by: BTreeSet<WeakKey<dyn Derived>>,
	this: Weak<VarBody<T>>,
}

impl<T> Var<T>
where
	T: 'static,
{
	pub fn new(value: T) -> Self
	where
		T: Hash,
	{
		Var {
			body: Rc::new_cyclic(|this| VarBody {
				slot: RefCell::new(Slot::new(value)),
				inner: RefCell::new(VarInner {
					used_by: BTreeSet::new(),
					this: this.clone(),
				}),
			}),
		}
	}

	/// Tracked read: the evaluation's parent becomes a subscriber.
	#[inline]
	pub fn get<'a>(&'a self, eval: &impl AsRef<Evaluation>) -> Ref<'a, T> {
		self.body.get(eval.as_ref())
	}

	/// Untracked read.
	#[inline]
	pub fn get_once(&self) -> Ref<'_, T> {
		Ref::map(self.body.slot.borrow(), |s| &s.value)
	}

	#[inline]
	pub fn set(&self, value: T)
	where
		T: Hash,
	{
		let _ = self.replace(value);
	}

	/// Write without invalidating subscribers. The hash is refreshed, so a
	/// later `set` of the same value is still recognized as unchanged.
	pub fn set_silent(&self, value: T)
	where
		T: Hash,
	{
		*self.body.slot.borrow_mut() = Slot::new(value);
	}

	pub fn replace(&self, value: T) -> T
	where
		T: Hash,
	{
		let next = Slot::new(value);
		let hash = next.hash;
		let old = {
			let mut slot = self.body.slot.borrow_mut();
			std::mem::replace(&mut *slot, next)
		};
		if old.hash != hash {
			self.body.invalidate();
		}
		old.value
	}

	pub fn update(&self, func: impl FnOnce(&mut T))
	where
		T: Hash,
	{
		let changed = {
			let mut slot = self.body.slot.borrow_mut();
			func(&mut slot.value);
			let hash = fxhash::hash64(&slot.value);
			let changed = slot.hash != hash;
			slot.hash = hash;
			changed
		};
		if changed {
			self.body.invalidate();
		}
	}
}

impl<T> VarBody<T>
where
	T: 'static,
{
	fn get<'a>(&'a self, eval: &Evaluation) -> Ref<'a, T> {
		let slot = self.slot.borrow();
		{
			let mut inner = self.inner.borrow_mut();
			eval.based_on(inner.this.upgrade().unwrap(), Version::Hash(slot.hash));
			let parent = eval.parent();
			inner.used_by.insert(WeakKey::new(parent));
		}
		Ref::map(slot, |s| &s.value)
	}

	fn invalidate(&self) {
		let inner = self.inner.borrow();
		for item in &inner.used_by {
			if let Some(item) = item.upgrade() {
				item.invalidate(Invalid::Definitely);
			}
		}
	}
}

impl<T: 'static> Observable for VarBody<T> {
	fn update(&self) -> Version {
		self.version()
	}

	fn version(&self) -> Version {
		Version::Hash(self.slot.borrow().hash)
	}

	fn used_by(&self, derived: Weak<dyn Derived>) {
		self.inner.borrow_mut().used_by.insert(WeakKey::new(derived));
	}

	fn not_used_by(&self, derived: &Weak<dyn Derived>) {
		self.inner
			.borrow_mut()
			.used_by
			.remove(&WeakKey::new(derived.clone()));
	}
}

impl<T> Debug for Var<T>
where
	T: 'static + Debug,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.get_once().fmt(f)
	}
}
