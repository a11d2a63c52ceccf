use std::cell::RefCell;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::batch::{enqueue, in_batch, Reactive};
use crate::evaluation::{Dependencies, Evaluation};
use crate::{Derived, Invalid, State};

/// A subscription over reactive state: runs its closure inside a tracked
/// [`Evaluation`] and re-runs whenever a recorded dependency changes.
///
/// The closure does not run at construction; call [`Watcher::prime`] for
/// the immediate first invocation. Subsequent runs are scheduled through
/// the batch drain loop and revalidate maybe-invalid dependencies first.
#[derive(Clone)]
pub struct Watcher {
	body: Rc<WatcherBody>,
}

pub(crate) struct WatcherBody {
	inner: RefCell<WatcherInner>,
}

struct WatcherInner {
	state: State,
	name: &'static str,
	func: Box<dyn Fn(&Evaluation)>,
	dependencies: Dependencies,
	this: Weak<WatcherBody>,
}

impl Drop for WatcherInner {
	fn drop(&mut self) {
		let refr = self.this.clone() as Weak<dyn Derived>;
		self.dependencies.release(&refr);
	}
}

impl Watcher {
	#[must_use]
	pub fn new(func: Box<dyn Fn(&Evaluation)>) -> Self {
		Self::with_name("<unnamed>", func)
	}

	#[must_use]
	pub fn with_name(name: &'static str, func: Box<dyn Fn(&Evaluation)>) -> Self {
		Watcher {
			body: Rc::new_cyclic(|this| WatcherBody {
				inner: RefCell::new(WatcherInner {
					state: State::Invalid(Invalid::Definitely),
					name,
					func,
					dependencies: Dependencies::new(),
					this: this.clone(),
				}),
			}),
		}
	}

	/// Run the closure now, unconditionally, recording dependencies.
	pub fn prime(&self) {
		self.body.run();
	}
}

impl WatcherBody {
	fn run(&self) {
		let mut inner = self.inner.borrow_mut();
		let this = inner.this.clone() as Weak<dyn Derived>;
		let eval = Evaluation::new(this.clone());
		(inner.func)(&eval);
		inner.dependencies.swap(eval.take(), &this);
		inner.state = State::Valid;
	}
}

impl Reactive for WatcherBody {
	fn refresh(&self) {
		let is_valid = {
			let mut inner = self.inner.borrow_mut();
			let is_valid = match inner.state {
				State::Valid => true,
				State::Invalid(Invalid::Definitely) => false,
				State::Invalid(Invalid::Maybe) => inner.dependencies.are_valid(),
			};
			if is_valid {
				inner.state = State::Valid;
			}
			is_valid
		};
		if !is_valid {
			self.run();
		}
	}
}

impl Derived for WatcherBody {
	fn invalidate(self: Rc<Self>, invalid: Invalid) {
		let mut inner = self.inner.borrow_mut();
		if matches!(inner.state, State::Valid) {
			if !in_batch() {
				panic!(
					"watcher `{}` invalidated outside of the `batch` function",
					inner.name
				);
			}
			inner.state = State::Invalid(invalid);
			drop(inner);
			enqueue(Rc::downgrade(&self) as Weak<dyn Reactive>);
		}
	}
}

impl std::fmt::Debug for Watcher {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Watcher")
			.field("name", &self.body.inner.borrow().name)
			.finish()
	}
}

/// Owned set of watchers, keeping the subscriptions alive.
#[derive(Default, Clone)]
pub struct Watchers<const N: usize = 4> {
	vec: SmallVec<[Watcher; N]>,
}

impl<const N: usize> Watchers<N> {
	pub fn add(&mut self, watcher: Watcher) {
		self.vec.push(watcher);
	}

	pub fn len(&self) -> usize {
		self.vec.len()
	}

	pub fn is_empty(&self) -> bool {
		self.vec.is_empty()
	}
}
