pub mod config;
pub mod logging;

pub mod archive;
pub mod downloader;
pub mod fetch;
pub mod gate;
pub mod janitor;
pub mod lifecycle;
pub mod server;
pub mod url_model;
