//! On-disk artifact generators: canonical names and NFO descriptors.

pub mod filename;
pub mod nfo;
