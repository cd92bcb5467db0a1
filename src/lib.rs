//! # Nidus
//!
//! A lightweight dependency-injection and module composition layer over axum.
//!
//! Nidus lets an application declare structs as injectable services, declare
//! hierarchical modules that bundle providers, imports, and route
//! collections, and resolve service instances by token (a type reference or
//! a string key) at request-handling time.
//!
//! ## Features
//!
//! - **Dependency Injection**: token-based container with automatic
//!   constructor-dependency resolution
//! - **Module Composition**: NestJS-style module trees with imports,
//!   providers, and routes
//! - **Global Providers**: singletons shared across the whole module tree
//! - **Dynamic Modules**: string-tokened providers for runtime-derived
//!   configuration
//! - **Request-time Injection**: an axum extractor resolving services from
//!   the container inside handlers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nidus::prelude::*;
//!
//! // 1. Declare a service; zero dependencies means a zero-argument build.
//! struct Greeter;
//!
//! impl Greeter {
//!     fn greet(&self) -> &'static str {
//!         "hello from nidus"
//!     }
//! }
//!
//! impl Injectable for Greeter {
//!     fn assemble(_args: &mut ResolvedArguments) -> Result<Self> {
//!         Ok(Greeter)
//!     }
//! }
//!
//! async fn hello(Inject(greeter): Inject<Greeter>) -> &'static str {
//!     greeter.greet()
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // 2. Mark it injectable before any module referencing it registers.
//!     metadata::mark_injectable::<Greeter>();
//!
//!     // 3. Compose the module tree and bootstrap.
//!     let mut root = Module::builder()
//!         .provider(Provider::class::<Greeter>())
//!         .route("/", Router::new().route("/hello", get(hello)))
//!         .build();
//!
//!     Application::bootstrap(&mut root).await?.serve("0.0.0.0:3000").await
//! }
//! ```

pub mod app;
pub mod config;
pub mod di;
pub mod error;
pub mod metadata;
pub mod module;
pub mod response;
pub mod routing;
pub mod token;

// Re-export core types
pub use app::{Application, shutdown_signal};
pub use config::ConfigService;
pub use di::{
    Container, GlobalScope, HasContainer, Inject, Injectable, Instance, Provider,
    ResolvedArguments,
};
pub use error::{NidusError, Result};
pub use module::{DynamicModule, Module, ModuleBuilder, ModuleImport};
pub use response::ApiResponse;
pub use routing::{AppState, RouteCollection, mount};
pub use token::Token;

// Re-export commonly used types from dependencies
pub use axum;

/// Prelude module for convenient imports
///
/// ```rust,ignore
/// use nidus::prelude::*;
/// ```
pub mod prelude {
    pub use crate::app::{Application, shutdown_signal};
    pub use crate::config::ConfigService;
    pub use crate::di::{
        Container, GlobalScope, HasContainer, Inject, Injectable, Instance, Provider,
        ResolvedArguments,
    };
    pub use crate::error::{NidusError, Result};
    pub use crate::metadata;
    pub use crate::module::{DynamicModule, Module, ModuleBuilder, ModuleImport};
    pub use crate::response::ApiResponse;
    pub use crate::routing::{AppState, RouteCollection, mount};
    pub use crate::token::Token;
    pub use axum::{
        Json, Router,
        extract::{Path, Query, State},
        http::StatusCode,
        response::{IntoResponse, Response},
        routing::{delete, get, patch, post, put},
    };
    pub use std::sync::Arc;
}
