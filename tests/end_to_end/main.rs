//! End-to-end tests through the top-level crate
//!
//! Exercises the public re-exports the way an embedding application would:
//! open a disk database, drive it through the handlers, reopen it.

mod persistence;
mod workflows;
