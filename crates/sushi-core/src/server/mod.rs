//! Loopback HTTP endpoint serving indexed model files to the renderer

pub mod file_server;

pub use file_server::{make_router, FileServer, FileServerConfig, LOCAL_FILE_ROUTE};
