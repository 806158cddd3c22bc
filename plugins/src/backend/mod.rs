mod file;
mod http;

pub use file::{FileTaskSource, LogReporter};
pub use http::{BackendHttpError, HttpBackend};
