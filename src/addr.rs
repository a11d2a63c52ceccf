use std::cmp::Ordering;
use std::ops::Deref;
use std::rc::{Rc, Weak};

/// Identity key for an `Rc` trait object, ordered by allocation address.
pub struct RcKey<T: ?Sized> {
	ptr: Rc<T>,
}

impl<T: ?Sized> RcKey<T> {
	pub fn new(ptr: Rc<T>) -> Self {
		RcKey { ptr }
	}

	fn addr(&self) -> usize {
		Rc::as_ptr(&self.ptr) as *const () as usize
	}
}

impl<T: ?Sized> Deref for RcKey<T> {
	type Target = Rc<T>;
	fn deref(&self) -> &Self::Target {
		&self.ptr
	}
}

impl<T: ?Sized> PartialEq for RcKey<T> {
	fn eq(&self, other: &Self) -> bool {
		self.addr() == other.addr()
	}
}

impl<T: ?Sized> Eq for RcKey<T> {}

impl<T: ?Sized> Ord for RcKey<T> {
	fn cmp(&self, other: &Self) -> Ordering {
		self.addr().cmp(&other.addr())
	}
}

impl<T: ?Sized> PartialOrd for RcKey<T> {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

/// Identity key for a `Weak` trait object.
pub struct WeakKey<T: ?Sized> {
	ptr: Weak<T>,
}

impl<T: ?Sized> WeakKey<T> {
	pub fn new(ptr: Weak<T>) -> Self {
		WeakKey { ptr }
	}

	fn addr(&self) -> usize {
		Weak::as_ptr(&self.ptr) as *const () as usize
	}
}

impl<T: ?Sized> Deref for WeakKey<T> {
	type Target = Weak<T>;
	fn deref(&self) -> &Self::Target {
		&self.ptr
	}
}

impl<T: ?Sized> PartialEq for WeakKey<T> {
	fn eq(&self, other: &Self) -> bool {
		self.addr() == other.addr()
	}
}

impl<T: ?Sized> Eq for WeakKey<T> {}

impl<T: ?Sized> Ord for WeakKey<T> {
	fn cmp(&self, other: &Self) -> Ordering {
		self.addr().cmp(&other.addr())
	}
}

impl<T: ?Sized> PartialOrd for WeakKey<T> {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}
