// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason
//! Run-time dynamic library loading that keeps the library search directory under control.
//!
//! A library opened through [`Library::open`] is loaded with its own directory as the OS
//! loader's search directory, and the working directory is removed from the search order, so a
//! stale or planted file elsewhere can't be picked up in its place. The search directory is
//! process-wide state; every load is serialized and restores it before returning.
//!
//! ```no_run
//! use dylib_guard::Library;
//!
//! let lib = Library::open("plugins/libengine.so")?;
//! let sym = lib.symbol("create_engine")?;
//! println!("create_engine = {:p}", sym.as_ptr());
//! # Ok::<(), dylib_guard::Error>(())
//! ```

pub mod error;
mod library;
mod loader;
mod os;
mod path;
mod search;
mod sym;

pub use error::{Error, ErrorKind};
pub use library::Library;
pub use loader::load;
pub use path::{Encoding, LibraryPath};
pub use search::search_directory;
pub use sym::Symbol;

/// The result of a dylib_guard function.
pub type Result<T> = std::result::Result<T, error::Error>;
