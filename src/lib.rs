pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod ffmpeg;
pub mod filters;
pub mod init;
pub mod probe;
pub mod request;
