// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason

use std::io;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::os::imp;
use crate::path::{Encoding, LibraryPath};

// Held across the whole of every load, since the search directory is process-wide.
static LOAD_LOCK: Mutex<()> = Mutex::new(());

pub(crate) type LoadLock = MutexGuard<'static, ()>;

/// Acquires the process-wide load lock.
///
/// A poisoned lock is recovered: [`SearchPathGuard`] restores the directory during unwinding.
pub(crate) fn lock() -> LoadLock {
	LOAD_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Returns the current library search directory in the requested encoding.
///
/// An empty path means no directory is configured. The query waits for any load in progress,
/// so it never observes a directory installed for the duration of a single load.
pub fn search_directory(encoding: Encoding) -> crate::Result<LibraryPath> {
	let _lock = lock();
	Ok(imp::search_directory(encoding)?)
}

/// Stops the OS loader from implicitly searching the working directory.
///
/// Does nothing once a search directory has been configured.
pub(crate) fn exclude_current_directory_once(_lock: &LoadLock) -> io::Result<()> {
	if !imp::search_directory_configured() {
		log::trace!("excluding the working directory from the library search path");
		imp::set_search_directory(&LibraryPath::empty(Encoding::native()))?;
	}
	Ok(())
}

/// Captures the current search directory in `encoding`, then installs `directory` if given.
pub(crate) fn begin_scoped_override(
	_lock: &LoadLock,
	directory: Option<&LibraryPath>,
	encoding: Encoding,
) -> io::Result<LibraryPath> {
	let previous = imp::search_directory(encoding)?;
	if let Some(directory) = directory {
		log::trace!("search directory '{previous}' -> '{directory}'");
		imp::set_search_directory(directory)?;
	}
	Ok(previous)
}

pub(crate) fn end_scoped_override(_lock: &LoadLock, previous: &LibraryPath) -> io::Result<()> {
	if restore_refused() {
		return Err(io::Error::new(
			io::ErrorKind::PermissionDenied,
			"search directory restore refused",
		));
	}
	log::trace!("restoring search directory '{previous}'");
	imp::set_search_directory(previous)
}

#[cfg(test)]
thread_local! {
	static REFUSE_RESTORE: std::cell::Cell<bool> = const { std::cell::Cell::new(false) };
}

/// Makes the next restore on this thread fail.
#[cfg(test)]
pub(crate) fn refuse_next_restore() {
	REFUSE_RESTORE.with(|refuse| refuse.set(true));
}

#[cfg(test)]
pub(crate) fn restore_refused() -> bool {
	REFUSE_RESTORE.with(|refuse| refuse.replace(false))
}

#[cfg(not(test))]
#[inline(always)]
const fn restore_refused() -> bool {
	false
}

/// Overrides the search directory until it is dropped or [`end`](SearchPathGuard::end)ed.
///
/// Borrowing the load lock keeps the override from outliving it.
#[must_use]
pub(crate) struct SearchPathGuard<'a> {
	lock: &'a LoadLock,
	previous: Option<LibraryPath>,
}

impl<'a> SearchPathGuard<'a> {
	/// Passing [`None`] as `directory` captures the current value without changing it.
	pub(crate) fn begin(
		lock: &'a LoadLock,
		directory: Option<&LibraryPath>,
		encoding: Encoding,
	) -> io::Result<Self> {
		let previous = begin_scoped_override(lock, directory, encoding)?;
		Ok(Self {
			lock,
			previous: Some(previous),
		})
	}

	#[cfg(test)]
	pub(crate) fn previous(&self) -> Option<&LibraryPath> {
		self.previous.as_ref()
	}

	/// Restores the captured directory, reporting failure instead of logging it.
	pub(crate) fn end(mut self) -> io::Result<()> {
		match self.previous.take() {
			Some(previous) => end_scoped_override(self.lock, &previous),
			None => Ok(()),
		}
	}
}

impl Drop for SearchPathGuard<'_> {
	fn drop(&mut self) {
		if let Some(previous) = self.previous.take() {
			if let Err(e) = end_scoped_override(self.lock, &previous) {
				log::error!("failed to restore library search directory '{previous}': {e}");
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::thread;

	fn current() -> LibraryPath {
		imp::search_directory(Encoding::native()).unwrap()
	}

	#[test]
	fn test_guard_restores_on_drop() {
		let dir = tempfile::tempdir().unwrap();
		let target = LibraryPath::from(dir.path());
		let lock = lock();
		exclude_current_directory_once(&lock).unwrap();
		let before = current();
		{
			let guard = SearchPathGuard::begin(&lock, Some(&target), Encoding::native()).unwrap();
			assert_eq!(guard.previous(), Some(&before));
			assert_eq!(current(), target);
		}
		assert_eq!(current(), before);
	}

	#[test]
	fn test_guard_end_restores() {
		let dir = tempfile::tempdir().unwrap();
		let target = LibraryPath::from(dir.path());
		let lock = lock();
		exclude_current_directory_once(&lock).unwrap();
		let before = current();
		let guard = SearchPathGuard::begin(&lock, Some(&target), Encoding::native()).unwrap();
		guard.end().unwrap();
		assert_eq!(current(), before);
	}

	#[test]
	fn test_guard_without_directory_keeps_value() {
		let lock = lock();
		exclude_current_directory_once(&lock).unwrap();
		let before = current();
		let guard = SearchPathGuard::begin(&lock, None, Encoding::native()).unwrap();
		assert_eq!(current(), before);
		drop(guard);
		assert_eq!(current(), before);
	}

	#[test]
	fn test_exclude_is_idempotent() {
		let lock = lock();
		exclude_current_directory_once(&lock).unwrap();
		let first = current();
		exclude_current_directory_once(&lock).unwrap();
		assert_eq!(current(), first);
		assert!(first.is_empty());
	}

	#[cfg(unix)]
	#[test]
	fn test_exclude_keeps_configured_directory() {
		let dir = tempfile::tempdir().unwrap();
		let target = LibraryPath::from(dir.path());
		let lock = lock();
		exclude_current_directory_once(&lock).unwrap();
		let before = current();
		imp::set_search_directory(&target).unwrap();
		exclude_current_directory_once(&lock).unwrap();
		assert_eq!(current(), target);
		imp::set_search_directory(&before).unwrap();
	}

	#[test]
	fn test_previous_never_sees_other_threads() {
		let dirs: Vec<_> = (0..8).map(|_| tempfile::tempdir().unwrap()).collect();
		let baseline = {
			let lock = lock();
			exclude_current_directory_once(&lock).unwrap();
			current()
		};
		thread::scope(|s| {
			for dir in &dirs {
				let baseline = &baseline;
				s.spawn(move || {
					let target = LibraryPath::from(dir.path());
					for _ in 0..25 {
						let lock = lock();
						let guard = SearchPathGuard::begin(&lock, Some(&target), Encoding::native()).unwrap();
						assert_eq!(guard.previous(), Some(baseline));
						thread::yield_now();
						assert_eq!(current(), target);
						guard.end().unwrap();
					}
				});
			}
		});
		assert_eq!(search_directory(Encoding::native()).unwrap(), baseline);
	}
}
