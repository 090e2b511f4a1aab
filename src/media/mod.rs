pub mod mime;
pub mod probe;
pub mod transcode;
