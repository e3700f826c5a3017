pub mod codec;
pub mod config;
pub mod encoding;
pub mod error;
pub mod measure;
pub mod report;
