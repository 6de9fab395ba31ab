//! Command implementations

pub mod completions;
pub mod init;
pub mod kinds;
pub mod records;
pub mod uom;
