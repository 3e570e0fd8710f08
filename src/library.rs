// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason

use std::{ffi, marker, mem, ptr};

use crate::os::{imp, Handle};
use crate::{loader, Error, LibraryPath, Result, Symbol};

/// An owned handle to a dynamic library loaded into this process.
///
/// The library is unloaded exactly once, when the `Library` is dropped or
/// [`close`](Library::close)d. `Library` can be moved but not cloned; wrap it in an
/// [`Arc`](std::sync::Arc) to share it.
#[derive(Debug)]
pub struct Library(pub(crate) Handle);

// the handle is opaque and managed by the OS loader.
unsafe impl Send for Library {}
unsafe impl Sync for Library {}

impl Library {
	/// Loads the library at `path`.
	///
	/// While the library loads, the library search directory is set to the directory `path`
	/// lives in, so its dependencies are found next to it rather than in the working directory.
	/// The previous search directory is restored before this returns, whether or not loading
	/// succeeded. See [`load`](crate::load).
	///
	/// # Errors
	///
	/// Returns [`ErrorKind::Load`](crate::ErrorKind::Load) if the OS loader fails.
	///
	/// # Examples
	///
	/// ```no_run
	/// use dylib_guard::Library;
	///
	/// let lib = Library::open("plugins/libengine.so").unwrap();
	/// ```
	#[inline]
	pub fn open<P: Into<LibraryPath>>(path: P) -> Result<Self> {
		loader::load(path)
	}

	/// Retrieves the address of the exported symbol `name`.
	///
	/// The name must match the export exactly; no demangling is done.
	///
	/// # Errors
	///
	/// Returns [`ErrorKind::SymbolNotFound`](crate::ErrorKind::SymbolNotFound) if the library
	/// has no such export.
	///
	/// # Examples
	///
	/// ```no_run
	/// use dylib_guard::Library;
	/// use std::mem;
	///
	/// let lib = Library::open("plugins/libengine.so").unwrap();
	/// let sym = lib.symbol("create_engine").unwrap();
	/// let create_engine: unsafe extern "C" fn() = unsafe { mem::transmute(sym.cast::<()>()) };
	/// ```
	pub fn symbol(&self, name: &str) -> Result<Symbol<'_>> {
		if self.0.is_null() {
			return Err(Error::InvalidHandle {
				name: name.to_owned(),
			});
		}
		let c_str = ffi::CString::new(name).map_err(|_| Error::InvalidName {
			name: name.to_owned(),
		})?;
		match unsafe { imp::dylib_symbol(self.0, &c_str) } {
			Ok(addr) => Ok(Symbol(addr, marker::PhantomData)),
			Err(failure) => Err(Error::SymbolNotFound {
				name: name.to_owned(),
				code: failure.code,
				reason: failure.reason,
			}),
		}
	}

	/// Unloads the library now instead of at the end of scope.
	///
	/// Unload failures are logged, never returned.
	#[inline]
	pub fn close(mut self) {
		self.unload();
	}

	/// Releases ownership of the native handle without unloading the library.
	#[inline]
	pub fn into_raw(self) -> *mut ffi::c_void {
		mem::ManuallyDrop::new(self).0
	}

	/// Takes ownership of a native module handle.
	///
	/// # Safety
	///
	/// `handle` must come from the OS loader (`dlopen` or `LoadLibrary`) or
	/// [`into_raw`](Library::into_raw), and must not be owned by anything else. A null
	/// handle is tolerated: symbol lookup then fails and dropping does nothing.
	#[inline]
	pub unsafe fn from_raw(handle: *mut ffi::c_void) -> Self {
		Self(handle)
	}

	fn unload(&mut self) {
		let handle = mem::replace(&mut self.0, ptr::null_mut());
		if handle.is_null() {
			return;
		}
		log::debug!("unloading library {handle:p}");
		if let Err(e) = unsafe { imp::dylib_close(handle) } {
			log::warn!("failed to unload library {handle:p}: {e}");
		}
	}
}

impl Drop for Library {
	fn drop(&mut self) {
		self.unload();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ErrorKind;

	#[test]
	fn test_null_handle_is_invalid() {
		let lib = unsafe { Library::from_raw(ptr::null_mut()) };
		let err = lib.symbol("foo").unwrap_err();
		assert_eq!(err.kind(), ErrorKind::InvalidHandle);
		assert_eq!(err.to_string(), "cannot get 'foo' from an unloaded library");
	}

	#[test]
	fn test_null_handle_into_raw() {
		let lib = unsafe { Library::from_raw(ptr::null_mut()) };
		assert!(lib.into_raw().is_null());
	}
}
