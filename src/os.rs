// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason
#[cfg(unix)]
pub(crate) mod unix;
#[cfg(windows)]
pub(crate) mod windows;

#[cfg(unix)]
pub(crate) use unix as imp;
#[cfg(windows)]
pub(crate) use windows as imp;

use std::{ffi, io};

/// Opaque module handle issued by the OS loader.
pub(crate) type Handle = *mut ffi::c_void;

/// Error code and message captured right after a failed loader call.
#[derive(Debug)]
pub(crate) struct OsFailure {
	pub(crate) code: i32,
	pub(crate) reason: String,
}

impl From<io::Error> for OsFailure {
	fn from(e: io::Error) -> Self {
		Self {
			code: e.raw_os_error().unwrap_or(-1),
			reason: e.to_string(),
		}
	}
}
