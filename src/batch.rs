use std::cell::{Cell, RefCell};
use std::rc::Weak;

/// A node that can be re-run by the drain loop after invalidation.
pub(crate) trait Reactive {
	fn refresh(&self);
}

thread_local! {
	static STARTED: Cell<bool> = const { Cell::new(false) };
	static QUEUE: RefCell<Vec<Weak<dyn Reactive>>> = RefCell::new(Vec::new());
}

pub fn in_batch() -> bool {
	STARTED.with(|s| s.get())
}

/// Group writes so dependent watchers run at most once per batch. The root
/// batch drains the invalidation queue before returning; writes performed
/// by draining watchers (or by settlement callbacks) extend the same drain.
pub fn batch(func: impl FnOnce()) {
	let is_root = STARTED.with(|s| !s.replace(true));
	func();
	if is_root {
		drain();
		STARTED.with(|s| s.set(false));
	}
}

pub(crate) fn enqueue(item: Weak<dyn Reactive>) {
	QUEUE.with(|q| q.borrow_mut().push(item));
}

fn drain() {
	loop {
		let changed = QUEUE.with(|q| std::mem::take(&mut *q.borrow_mut()));
		if changed.is_empty() {
			break;
		}
		for item in changed {
			if let Some(item) = item.upgrade() {
				item.refresh();
			}
		}
	}
}
