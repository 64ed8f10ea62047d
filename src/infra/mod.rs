//! Infrastructure layer
//!
//! Handles I/O with the outside world: the container engine, the host
//! toolchain and the filesystem.

pub mod container;
pub mod filesystem;
pub mod session;
pub mod toolchain;
