//! # Todokit App
//!
//! Configuration, telemetry and process wiring for the `todokit` binary:
//!
//! - [`config`]: [`Config`] from `TODOKIT_*` variables
//! - [`telemetry`]: the tracing subscriber
//! - [`wiring`]: [`build_app`] composes the domain service with every
//!   transport; the log consumer and the maintenance router
//! - [`lifecycle`]: [`Application`] binds the listeners and runs until
//!   shutdown
//!
//! Listeners:
//!
//! | listener      | default         | serves                                 |
//! |---------------|-----------------|----------------------------------------|
//! | HTTP          | `0.0.0.0:8000`  | `/todos`, `/todos/:id/done`, `/graphql`, `/health` |
//! | gRPC          | `0.0.0.0:8001`  | `todo.v1beta1.TodoList`                |
//! | maintenance   | `0.0.0.0:10000` | `/health`, `/metrics`                  |

pub mod config;
pub mod lifecycle;
pub mod telemetry;
pub mod wiring;

pub use config::{Config, ConfigError, EventBusKind, LogFormat};
pub use lifecycle::Application;
pub use wiring::{App, AppComponents, build_app, event_bus, log_consumer, maintenance_router};
