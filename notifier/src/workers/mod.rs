//! Background workers

pub mod broadcaster;
