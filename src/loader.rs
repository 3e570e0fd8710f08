// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason

use std::env;

use crate::os::{imp, OsFailure};
use crate::search::{self, SearchPathGuard};
use crate::{Error, Library, LibraryPath, Result};

/// Loads the library at `path` into the process.
///
/// Every call is serialized on a process-wide lock and goes through these steps:
///
/// 1. The working directory is removed from the OS loader's search order, once per process.
/// 2. The current search directory is captured and, if `path` has a directory component, that
///    directory is installed in its place. A bare file name leaves the search directory alone.
/// 3. The OS loader is invoked.
/// 4. The captured search directory is put back, even if loading failed.
///
/// The path keeps its [`Encoding`](crate::Encoding), which picks the narrow or wide loader
/// entry point on Windows.
///
/// # Errors
///
/// * [`ErrorKind::InvalidName`](crate::ErrorKind::InvalidName) if `path` is empty or holds a
///   NUL character.
/// * [`ErrorKind::Load`](crate::ErrorKind::Load) if the OS loader fails. The error carries the
///   path, the OS error code and the working directory at the time of failure.
/// * [`ErrorKind::SearchDirectory`](crate::ErrorKind::SearchDirectory) if the search directory
///   could not be read, overridden or restored. A library loaded before the restore failed is
///   unloaded again.
pub fn load<P: Into<LibraryPath>>(path: P) -> Result<Library> {
	let path = path.into();
	if path.is_empty() || path.contains_nul() {
		return Err(Error::InvalidName {
			name: path.to_string(),
		});
	}
	// a path the loader can't take must not reach the search directory either
	if let Err(failure) = imp::check_path(&path) {
		return Err(load_error(path, failure));
	}

	let lock = search::lock();
	search::exclude_current_directory_once(&lock)?;
	let directory = path.directory().filter(|dir| !dir.is_empty());
	log::debug!("loading library '{path}'");
	let guard = SearchPathGuard::begin(&lock, directory.as_ref(), path.encoding())?;
	let opened = unsafe { imp::dylib_open(&path) };
	let restored = guard.end();
	drop(lock);

	match opened {
		Ok(handle) => {
			let library = Library(handle);
			if let Err(e) = restored {
				log::error!("failed to restore library search directory after loading '{path}': {e}");
				return Err(e.into());
			}
			log::debug!("loaded library '{path}' at {handle:p}");
			Ok(library)
		}
		Err(failure) => {
			if let Err(e) = restored {
				log::error!("failed to restore library search directory after loading '{path}': {e}");
			}
			Err(load_error(path, failure))
		}
	}
}

fn load_error(path: LibraryPath, failure: OsFailure) -> Error {
	let cwd = env::current_dir().unwrap_or_default();
	log::debug!("failed to load library '{path}': {}", failure.reason);
	Error::Load {
		path,
		code: failure.code,
		reason: failure.reason,
		cwd,
	}
}
