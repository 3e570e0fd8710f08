// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason
use super::{Handle, OsFailure};
use crate::path::{Encoding, LibraryPath};
use std::{ffi, io, iter, ptr};

mod c;

fn to_wide(units: &[u16]) -> Vec<u16> {
	units.iter().copied().chain(iter::once(0u16)).collect()
}

fn to_narrow(bytes: &[u8]) -> io::Result<ffi::CString> {
	ffi::CString::new(bytes).map_err(io::Error::from)
}

/// Fails the way [`dylib_open`] would if `path` can't be handed to the loader at all.
pub(crate) fn check_path(path: &LibraryPath) -> Result<(), OsFailure> {
	match path {
		LibraryPath::Narrow(bytes) => to_narrow(bytes).map(drop).map_err(OsFailure::from),
		LibraryPath::Wide(_) => Ok(()),
	}
}

pub(crate) unsafe fn dylib_open(path: &LibraryPath) -> Result<Handle, OsFailure> {
	let handle = match path {
		LibraryPath::Narrow(bytes) => {
			let c_str = to_narrow(bytes)?;
			c::LoadLibraryA(c_str.as_ptr())
		}
		LibraryPath::Wide(units) => {
			let wide_str = to_wide(units);
			c::LoadLibraryW(wide_str.as_ptr())
		}
	};
	if handle.is_null() {
		// windows dumps *all* error info into this call.
		Err(io::Error::last_os_error().into())
	} else {
		Ok(handle)
	}
}

pub(crate) unsafe fn dylib_symbol(lib_handle: Handle, name: &ffi::CStr) -> Result<*mut ffi::c_void, OsFailure> {
	let addr = c::GetProcAddress(lib_handle, name.as_ptr());
	if addr.is_null() {
		Err(io::Error::last_os_error().into())
	} else {
		Ok(addr.cast_mut())
	}
}

pub(crate) unsafe fn dylib_close(lib_handle: Handle) -> io::Result<()> {
	if c::FreeLibrary(lib_handle) == 0 {
		Err(io::Error::last_os_error())
	} else {
		Ok(())
	}
}

// `GetDllDirectory` can't tell "" from unset, both report a length of at most one.
pub(crate) fn search_directory_configured() -> bool {
	unsafe { c::GetDllDirectoryW(0, ptr::null_mut()) > 1 }
}

fn read_dll_directory<T, F>(get: F) -> io::Result<Vec<T>>
where
	T: Copy + Default,
	F: Fn(c::DWORD, *mut T) -> c::DWORD,
{
	let mut buffer = Vec::new();
	loop {
		let required = get(0, ptr::null_mut());
		if required <= 1 {
			return Ok(Vec::new());
		}
		buffer.resize(required as usize, T::default());
		let written = get(required, buffer.as_mut_ptr());
		if written == 0 {
			return Err(io::Error::last_os_error());
		}
		// the directory may have grown between the two calls
		if (written as usize) < buffer.len() {
			buffer.truncate(written as usize);
			return Ok(buffer);
		}
	}
}

pub(crate) fn search_directory(encoding: Encoding) -> io::Result<LibraryPath> {
	match encoding {
		Encoding::Narrow => {
			read_dll_directory(|len, buf| unsafe { c::GetDllDirectoryA(len, buf) }).map(LibraryPath::Narrow)
		}
		Encoding::Wide => {
			read_dll_directory(|len, buf| unsafe { c::GetDllDirectoryW(len, buf) }).map(LibraryPath::Wide)
		}
	}
}

/// An empty directory removes the working directory from the search order.
pub(crate) fn set_search_directory(directory: &LibraryPath) -> io::Result<()> {
	let result = match directory {
		LibraryPath::Narrow(bytes) => {
			let c_str = to_narrow(bytes)?;
			unsafe { c::SetDllDirectoryA(c_str.as_ptr()) }
		}
		LibraryPath::Wide(units) => {
			let wide_str = to_wide(units);
			unsafe { c::SetDllDirectoryW(wide_str.as_ptr()) }
		}
	};
	if result == 0 {
		Err(io::Error::last_os_error())
	} else {
		Ok(())
	}
}
