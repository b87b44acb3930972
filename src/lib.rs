pub mod census;
pub mod config;
pub mod domain;
pub mod download;
pub mod error;
pub mod fs_util;
pub mod geometry;
pub mod layout;
pub mod output;
pub mod shapes;
pub mod store;
pub mod sync;
pub mod transform;
