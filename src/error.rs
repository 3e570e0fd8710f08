// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason

use std::{io, path::PathBuf};

use crate::LibraryPath;

/// A list specifying general categories of [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	Load,
	SymbolNotFound,
	InvalidHandle,
	InvalidName,
	SearchDirectory,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// The OS loader failed to load the module.
	///
	/// `cwd` is the working directory at the time of failure and is empty if it could not be
	/// read. On unix `code` is `-1` when the dynamic linker left no `errno` behind.
	#[error("cannot load library '{path}': {code} ({reason}) from cwd: {}", .cwd.display())]
	Load {
		path: LibraryPath,
		code: i32,
		reason: String,
		cwd: PathBuf,
	},
	/// The module does not export `name`.
	#[error("cannot locate symbol '{name}': {code} ({reason})")]
	SymbolNotFound {
		name: String,
		code: i32,
		reason: String,
	},
	/// A symbol was requested from a library with no native handle.
	#[error("cannot get '{name}' from an unloaded library")]
	InvalidHandle { name: String },
	/// The name is empty or holds a NUL character.
	#[error("invalid library or symbol name '{name}'")]
	InvalidName { name: String },
	/// The library search directory could not be read or updated.
	#[error("library search directory: {0}")]
	SearchDirectory(#[from] io::Error),
}

impl Error {
	#[inline]
	pub const fn kind(&self) -> ErrorKind {
		match self {
			Self::Load { .. } => ErrorKind::Load,
			Self::SymbolNotFound { .. } => ErrorKind::SymbolNotFound,
			Self::InvalidHandle { .. } => ErrorKind::InvalidHandle,
			Self::InvalidName { .. } => ErrorKind::InvalidName,
			Self::SearchDirectory(_) => ErrorKind::SearchDirectory,
		}
	}

	/// Returns the OS error code carried by this error, if any.
	pub fn raw_os_error(&self) -> Option<i32> {
		match self {
			Self::Load { code, .. } | Self::SymbolNotFound { code, .. } => Some(*code),
			Self::SearchDirectory(e) => e.raw_os_error(),
			Self::InvalidHandle { .. } | Self::InvalidName { .. } => None,
		}
	}
}
