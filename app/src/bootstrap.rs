//! Application Bootstrap
//!
//! Everything handlers can ask for as a parameter is registered here, before
//! the router is built. The engine must be among them.

use satchel::{AppConfig, Config, Container, ContainerError, Engine, MiddlewareRegistry};
use std::sync::Arc;

use crate::middleware::LoggingMiddleware;
use crate::services::{AuditTrail, UserStore};

/// Register the engine and application services
pub fn register(container: &Container) -> Result<(), ContainerError> {
    // Global middleware (runs on every request in registration order)
    let middleware = MiddlewareRegistry::new().append(LoggingMiddleware);
    container.add_singleton(Arc::new(Engine::with_middleware(middleware)))?;

    container.add_singleton(Config::get::<AppConfig>().unwrap_or_default())?;
    container.add_singleton(Arc::new(UserStore::seeded()))?;
    container.add_disposable(AuditTrail::begin)?;

    Ok(())
}
