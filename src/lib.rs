//! HTTP relay that forwards admitted `SELECT` and `INSERT` statements to the
//! `patient` database and returns the raw results as JSON.

pub mod libs;

pub use libs::*;
