// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason

use std::{ffi, marker};

/// An exported address resolved from a [`Library`](crate::Library).
///
/// The lifetime ties the address to the library it came from; it must not be used once the
/// library has been dropped.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[repr(transparent)]
pub struct Symbol<'a>(pub(crate) *mut ffi::c_void, pub(crate) marker::PhantomData<&'a ()>);

impl<'a> Symbol<'a> {
	/// Casts to a pointer of another type.
	#[inline]
	pub const fn cast<T>(self) -> *mut T {
		self.0 as _
	}

	/// Returns the raw address. Never null.
	#[inline]
	pub const fn as_ptr(self) -> *mut ffi::c_void {
		self.0
	}
}
