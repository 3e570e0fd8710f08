// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason
#![allow(clippy::upper_case_acronyms)]
#![allow(non_snake_case)]
#![allow(non_camel_case_types)]

use std::ffi;
pub use std::os::windows::raw::HANDLE;

pub type HMODULE = HANDLE;
pub type PCSTR = *const ffi::c_char;
pub type PSTR = *mut u8;
pub type PCWSTR = *const u16;
pub type PWSTR = *mut u16;
pub type BOOL = i32;
pub type DWORD = u32;

extern "system" {
	pub fn LoadLibraryA(lplibfilename: PCSTR) -> HMODULE;
	pub fn LoadLibraryW(lplibfilename: PCWSTR) -> HMODULE;
	pub fn GetProcAddress(hmodule: HMODULE, lpprocname: PCSTR) -> *const ffi::c_void;
	pub fn FreeLibrary(hlibmodule: HMODULE) -> BOOL;
	pub fn GetDllDirectoryA(nbufferlength: DWORD, lpbuffer: PSTR) -> DWORD;
	pub fn GetDllDirectoryW(nbufferlength: DWORD, lpbuffer: PWSTR) -> DWORD;
	pub fn SetDllDirectoryA(lppathname: PCSTR) -> BOOL;
	pub fn SetDllDirectoryW(lppathname: PCWSTR) -> BOOL;
}
