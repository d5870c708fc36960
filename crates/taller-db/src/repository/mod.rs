//! # Repositories
//!
//! One repository per table. Repositories are cheap to clone: they hold a
//! pool handle, not a connection.

pub mod product;
