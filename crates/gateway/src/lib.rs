#![forbid(unsafe_code)]

pub mod http;
pub mod repository;

pub use http::{HttpBackend, HttpBackendConfig, HttpConfigError};
pub use repository::{Backend, GatewayError, GradingService, InMemoryBackend, QuizSource};
