//! # Domain Layer
//!
//! Pure delegation and signature logic with no I/O dependencies.

pub mod ecdsa;
pub mod entities;
pub mod state;
pub mod value_objects;
