#![cfg(target_os = "linux")]

use dylib_guard::*;
use std::ffi::{c_char, c_int};
use std::{fs, mem, path, thread};

type AtoiFn = unsafe extern "C" fn(*const c_char) -> c_int;

fn atoi(lib: &Library) -> AtoiFn {
	let sym = lib.symbol("atoi").unwrap();
	unsafe { mem::transmute(sym.as_ptr()) }
}

// finds the libc this process has mapped, if it is a glibc-style `libc.so`.
fn libc_path() -> Option<path::PathBuf> {
	let maps = fs::read_to_string("/proc/self/maps").ok()?;
	maps.lines()
		.filter_map(|line| line.split_whitespace().nth(5))
		.find(|name| name.starts_with('/') && name.contains("/libc.so"))
		.map(path::PathBuf::from)
}

#[test]
fn test_atoi_linux() {
	let lib = Library::open("libc.so.6").unwrap();
	let five = unsafe { atoi(&lib)(b"5\0".as_ptr().cast()) };
	assert_eq!(five, 5);
}

#[test]
fn test_symbol_not_found() {
	let lib = Library::open("libc.so.6").unwrap();
	match lib.symbol("does_not_exist") {
		Err(Error::SymbolNotFound { name, reason, .. }) => {
			assert_eq!(name, "does_not_exist");
			assert!(!reason.is_empty());
		}
		other => panic!("expected a missing symbol, got {other:?}"),
	}
}

#[test]
fn test_symbol_nul() {
	let lib = Library::open("libc.so.6").unwrap();
	let err = lib.symbol("at\0oi").unwrap_err();
	assert_eq!(err.kind(), ErrorKind::InvalidName);
}

#[test]
fn test_absolute_path() {
	let Some(libc) = libc_path() else {
		return;
	};
	let before = search_directory(Encoding::Narrow).unwrap();
	let lib = Library::open(libc.as_path()).unwrap();
	assert_eq!(search_directory(Encoding::Narrow).unwrap(), before);
	let seven = unsafe { atoi(&lib)(b"7\0".as_ptr().cast()) };
	assert_eq!(seven, 7);
	lib.close();
	assert_eq!(search_directory(Encoding::Narrow).unwrap(), before);
}

#[test]
fn test_wide_path() {
	let units: Vec<u16> = "libc.so.6".encode_utf16().collect();
	let lib = load(LibraryPath::wide(units)).unwrap();
	assert!(!lib.symbol("atoi").unwrap().as_ptr().is_null());
}

#[test]
fn test_raw_round_trip() {
	let lib = Library::open("libc.so.6").unwrap();
	let raw = lib.into_raw();
	assert!(!raw.is_null());
	let lib = unsafe { Library::from_raw(raw) };
	assert!(lib.symbol("atoi").is_ok());
}

#[test]
fn test_shared_across_threads() {
	let lib = std::sync::Arc::new(Library::open("libc.so.6").unwrap());
	let handles: Vec<_> = (0..4)
		.map(|_| {
			let lib = lib.clone();
			thread::spawn(move || {
				let three = unsafe { atoi(&lib)(b"3\0".as_ptr().cast()) };
				assert_eq!(three, 3);
			})
		})
		.collect();
	for handle in handles {
		handle.join().unwrap();
	}
}
