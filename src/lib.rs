pub mod app;
pub mod config;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod scheduler;
pub mod services;
pub mod validation;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
