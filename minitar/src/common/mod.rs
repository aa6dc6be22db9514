mod read_write;

pub mod io;

pub use read_write::*;
