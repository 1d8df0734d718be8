//! Client state for the Plumber web console.
//!
//! Provides:
//! - Entity stores (`AgentStore`, `TaskStore`) caching server collections
//!   with loading/error status
//! - `AuthStore` - login, logout and the current identity
//! - `NavigationGuard` - route table and login gating
//! - `AppContext` - one wired-up client instance
//! - Durable credential storage (feature: file)

pub mod agent;
pub mod auth;
pub mod context;
pub mod navigation;
pub mod state;
pub mod storage;
pub mod task;

pub use agent::AgentStore;
pub use auth::{AuthError, AuthStore};
pub use context::AppContext;
pub use navigation::{HOME_PATH, Navigation, NavigationGuard, Route, find_route};
pub use state::StoreState;
#[cfg(feature = "file")]
pub use storage::FileStore;
pub use task::{TaskData, TaskStore};
