//! Status message broadcasting

pub mod broadcaster;
