//! SQLite database module for the prize engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
