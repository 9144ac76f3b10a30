//! Filesystem side of the settings pipeline.

pub mod paths;
pub mod reader;
pub mod writer;
