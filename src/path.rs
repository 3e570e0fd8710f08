// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason

use std::{borrow::Cow, ffi, fmt, path};

/// The string encoding a [`LibraryPath`] is held in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
	/// Multibyte string. On Windows this is the active code page, on unix the raw path bytes.
	Narrow,
	/// UTF-16 string.
	Wide,
}

impl Encoding {
	/// The encoding the platform's own path type converts into.
	///
	/// This is [`Narrow`](Encoding::Narrow) on unix and [`Wide`](Encoding::Wide) on Windows.
	#[inline]
	pub const fn native() -> Self {
		if cfg!(windows) {
			Self::Wide
		} else {
			Self::Narrow
		}
	}
}

/// A path to a loadable module, either absolute or relative.
///
/// The path is kept in the encoding it was given in so the platform layer can pick the
/// matching OS entry point. No normalization is done beyond extracting the directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LibraryPath {
	Narrow(Vec<u8>),
	Wide(Vec<u16>),
}

#[cfg(windows)]
#[inline]
const fn is_separator(unit: u32) -> bool {
	unit == b'\\' as u32 || unit == b'/' as u32
}

#[cfg(not(windows))]
#[inline]
const fn is_separator(unit: u32) -> bool {
	unit == b'/' as u32
}

impl LibraryPath {
	/// Constructs a narrow path from raw bytes.
	#[inline]
	pub fn narrow(bytes: impl Into<Vec<u8>>) -> Self {
		Self::Narrow(bytes.into())
	}

	/// Constructs a wide path from UTF-16 code units.
	#[inline]
	pub fn wide(units: impl Into<Vec<u16>>) -> Self {
		Self::Wide(units.into())
	}

	#[inline]
	pub const fn empty(encoding: Encoding) -> Self {
		match encoding {
			Encoding::Narrow => Self::Narrow(Vec::new()),
			Encoding::Wide => Self::Wide(Vec::new()),
		}
	}

	#[inline]
	pub const fn encoding(&self) -> Encoding {
		match self {
			Self::Narrow(_) => Encoding::Narrow,
			Self::Wide(_) => Encoding::Wide,
		}
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		match self {
			Self::Narrow(bytes) => bytes.is_empty(),
			Self::Wide(units) => units.is_empty(),
		}
	}

	/// Returns `true` if the path holds a NUL unit, which no OS loader can be handed.
	pub(crate) fn contains_nul(&self) -> bool {
		match self {
			Self::Narrow(bytes) => bytes.contains(&0),
			Self::Wide(units) => units.contains(&0),
		}
	}

	/// Returns everything before the last path separator, or [`None`] if there is no separator.
	///
	/// # Examples
	///
	/// ```
	/// use dylib_guard::LibraryPath;
	///
	/// assert_eq!(LibraryPath::from("a/b/c").directory(), Some(LibraryPath::from("a/b")));
	/// assert_eq!(LibraryPath::from("c").directory(), None);
	/// ```
	pub fn directory(&self) -> Option<Self> {
		match self {
			Self::Narrow(bytes) => bytes
				.iter()
				.rposition(|&b| is_separator(b.into()))
				.map(|pos| Self::Narrow(bytes[..pos].to_vec())),
			Self::Wide(units) => units
				.iter()
				.rposition(|&u| is_separator(u.into()))
				.map(|pos| Self::Wide(units[..pos].to_vec())),
		}
	}

	/// Returns the directory component of the path, or the whole path unchanged if it has no
	/// separator.
	///
	/// Use [`directory`](LibraryPath::directory) to tell the two cases apart.
	pub fn directory_of(&self) -> Self {
		self.directory().unwrap_or_else(|| self.clone())
	}

	/// Lossily converts the path for display and diagnostics.
	pub fn to_string_lossy(&self) -> Cow<'_, str> {
		match self {
			Self::Narrow(bytes) => String::from_utf8_lossy(bytes),
			Self::Wide(units) => Cow::Owned(String::from_utf16_lossy(units)),
		}
	}
}

impl fmt::Display for LibraryPath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_string_lossy())
	}
}

#[cfg(unix)]
impl From<&ffi::OsStr> for LibraryPath {
	#[inline]
	fn from(value: &ffi::OsStr) -> Self {
		use std::os::unix::ffi::OsStrExt;
		Self::Narrow(value.as_bytes().to_vec())
	}
}

#[cfg(windows)]
impl From<&ffi::OsStr> for LibraryPath {
	#[inline]
	fn from(value: &ffi::OsStr) -> Self {
		use std::os::windows::ffi::OsStrExt;
		Self::Wide(value.encode_wide().collect())
	}
}

impl From<&str> for LibraryPath {
	#[inline]
	fn from(value: &str) -> Self {
		Self::from(ffi::OsStr::new(value))
	}
}

impl From<String> for LibraryPath {
	#[inline]
	fn from(value: String) -> Self {
		Self::from(value.as_str())
	}
}

impl From<&path::Path> for LibraryPath {
	#[inline]
	fn from(value: &path::Path) -> Self {
		Self::from(value.as_os_str())
	}
}

impl From<path::PathBuf> for LibraryPath {
	#[inline]
	fn from(value: path::PathBuf) -> Self {
		Self::from(value.as_path())
	}
}

impl From<&[u16]> for LibraryPath {
	#[inline]
	fn from(value: &[u16]) -> Self {
		Self::Wide(value.to_vec())
	}
}

impl From<&LibraryPath> for LibraryPath {
	#[inline]
	fn from(value: &LibraryPath) -> Self {
		value.clone()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn wide(s: &str) -> LibraryPath {
		LibraryPath::wide(s.encode_utf16().collect::<Vec<_>>())
	}

	#[test]
	fn test_directory_of_nested() {
		let path = LibraryPath::narrow("a/b/c");
		assert_eq!(path.directory_of(), LibraryPath::narrow("a/b"));
		assert_eq!(wide("a/b/c").directory_of(), wide("a/b"));
	}

	#[test]
	fn test_directory_of_bare_name() {
		let path = LibraryPath::narrow("c");
		assert_eq!(path.directory(), None);
		assert_eq!(path.directory_of(), path);
		assert_eq!(wide("c").directory_of(), wide("c"));
	}

	#[test]
	fn test_directory_uses_last_separator() {
		let path = LibraryPath::narrow("/usr/lib/x86_64/libfoo.so");
		assert_eq!(path.directory(), Some(LibraryPath::narrow("/usr/lib/x86_64")));
	}

	#[test]
	fn test_directory_of_root_is_empty() {
		let dir = LibraryPath::narrow("/libfoo.so").directory().unwrap();
		assert!(dir.is_empty());
		assert_eq!(dir.encoding(), Encoding::Narrow);
	}

	#[cfg(windows)]
	#[test]
	fn test_directory_backslash() {
		let path = LibraryPath::from(r"C:\plugins\sub/engine.dll");
		assert_eq!(path.directory(), Some(LibraryPath::from(r"C:\plugins\sub")));
		let path = LibraryPath::narrow(r"C:\plugins\engine.dll");
		assert_eq!(path.directory(), Some(LibraryPath::narrow(r"C:\plugins")));
	}

	#[cfg(unix)]
	#[test]
	fn test_backslash_is_not_a_separator() {
		let path = LibraryPath::from(r"odd\name.so");
		assert_eq!(path.directory(), None);
	}

	#[test]
	fn test_display_lossy() {
		assert_eq!(wide("lib/ü.so").to_string(), "lib/ü.so");
		assert_eq!(LibraryPath::narrow(&b"lib\xff.so"[..]).to_string(), "lib\u{fffd}.so");
	}

	#[test]
	fn test_contains_nul() {
		assert!(LibraryPath::narrow(&b"a\0b"[..]).contains_nul());
		assert!(!wide("ab").contains_nul());
	}

	#[test]
	fn test_native_encoding() {
		assert_eq!(LibraryPath::from("x").encoding(), Encoding::native());
	}
}
