// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason
use super::{Handle, OsFailure};
use crate::path::{Encoding, LibraryPath};
use std::{ffi, io, sync};

// `dlerror` is only thread-local on some libcs.
#[cfg(not(any(target_os = "linux", target_os = "macos", target_env = "gnu")))]
#[inline]
fn dylib_guard<'a>() -> sync::MutexGuard<'a, ()> {
	static LOCK: sync::Mutex<()> = sync::Mutex::new(());
	LOCK.lock().unwrap_or_else(sync::PoisonError::into_inner)
}

#[cfg(any(target_os = "linux", target_os = "macos", target_env = "gnu"))]
#[inline(always)]
fn dylib_guard() {}

// The dynamic linker has no process-wide search directory and never looks in the working
// directory, so the value lives here. `None` until the working directory is excluded.
static SEARCH_DIRECTORY: sync::Mutex<Option<Vec<u8>>> = sync::Mutex::new(None);

fn search_state<'a>() -> sync::MutexGuard<'a, Option<Vec<u8>>> {
	SEARCH_DIRECTORY
		.lock()
		.unwrap_or_else(sync::PoisonError::into_inner)
}

#[cfg(any(target_os = "linux", target_os = "emscripten", target_os = "redox"))]
#[inline]
unsafe fn clear_errno() {
	*libc::__errno_location() = 0;
}

#[cfg(any(target_os = "android", target_os = "netbsd", target_os = "openbsd"))]
#[inline]
unsafe fn clear_errno() {
	*libc::__errno() = 0;
}

#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
#[inline]
unsafe fn clear_errno() {
	*libc::__error() = 0;
}

#[cfg(any(target_os = "solaris", target_os = "illumos"))]
#[inline]
unsafe fn clear_errno() {
	*libc::___errno() = 0;
}

// No errno accessor is bound for the remaining targets, so a stale errno left by an earlier
// call may be reported as the failure code there.
#[cfg(not(any(
	target_os = "linux",
	target_os = "emscripten",
	target_os = "redox",
	target_os = "android",
	target_os = "netbsd",
	target_os = "openbsd",
	target_os = "macos",
	target_os = "ios",
	target_os = "freebsd",
	target_os = "solaris",
	target_os = "illumos"
)))]
#[inline(always)]
unsafe fn clear_errno() {}

unsafe fn dylib_error() -> String {
	let message = libc::dlerror();
	if message.is_null() {
		String::from("unknown dynamic linker error")
	} else {
		ffi::CStr::from_ptr(message).to_string_lossy().into_owned()
	}
}

// errno has to be read before anything else touches it.
unsafe fn last_failure() -> OsFailure {
	let code = match io::Error::last_os_error().raw_os_error() {
		None | Some(0) => -1,
		Some(code) => code,
	};
	OsFailure {
		code,
		reason: dylib_error(),
	}
}

fn to_bytes(path: &LibraryPath) -> io::Result<Vec<u8>> {
	match path {
		LibraryPath::Narrow(bytes) => Ok(bytes.clone()),
		LibraryPath::Wide(units) => String::from_utf16(units)
			.map(String::into_bytes)
			.map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e)),
	}
}

fn to_c_string(path: &LibraryPath) -> Result<ffi::CString, OsFailure> {
	to_bytes(path)
		.and_then(|bytes| ffi::CString::new(bytes).map_err(io::Error::from))
		.map_err(|e| OsFailure {
			code: libc::EINVAL,
			reason: e.to_string(),
		})
}

/// Fails the way [`dylib_open`] would if `path` can't be handed to `dlopen` at all.
pub(crate) fn check_path(path: &LibraryPath) -> Result<(), OsFailure> {
	to_c_string(path).map(drop)
}

pub(crate) unsafe fn dylib_open(path: &LibraryPath) -> Result<Handle, OsFailure> {
	let c_str = to_c_string(path)?;
	let _lock = dylib_guard();
	let _ = libc::dlerror(); // clear existing errors
	clear_errno();
	let handle = libc::dlopen(c_str.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL);
	if handle.is_null() {
		Err(last_failure())
	} else {
		Ok(handle)
	}
}

pub(crate) unsafe fn dylib_symbol(lib_handle: Handle, name: &ffi::CStr) -> Result<*mut ffi::c_void, OsFailure> {
	let _lock = dylib_guard();
	let _ = libc::dlerror(); // clear existing errors
	clear_errno();
	let addr = libc::dlsym(lib_handle, name.as_ptr());
	if addr.is_null() {
		Err(last_failure())
	} else {
		Ok(addr)
	}
}

pub(crate) unsafe fn dylib_close(lib_handle: Handle) -> io::Result<()> {
	let _lock = dylib_guard();
	let _ = libc::dlerror(); // clear existing errors
	if libc::dlclose(lib_handle) != 0 {
		Err(io::Error::new(io::ErrorKind::Other, dylib_error()))
	} else {
		Ok(())
	}
}

pub(crate) fn search_directory_configured() -> bool {
	search_state().is_some()
}

pub(crate) fn search_directory(encoding: Encoding) -> io::Result<LibraryPath> {
	let bytes = search_state().clone().unwrap_or_default();
	Ok(match encoding {
		Encoding::Narrow => LibraryPath::Narrow(bytes),
		Encoding::Wide => LibraryPath::Wide(String::from_utf8_lossy(&bytes).encode_utf16().collect()),
	})
}

pub(crate) fn set_search_directory(directory: &LibraryPath) -> io::Result<()> {
	let bytes = to_bytes(directory)?;
	*search_state() = Some(bytes);
	Ok(())
}
