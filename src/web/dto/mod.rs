//! Data Transfer Objects for the file API.

pub mod response;

pub use response::*;
