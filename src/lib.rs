pub mod app;
pub mod auth;
pub mod challenge;
pub mod cli;
pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod middleware;
pub mod path;
pub mod session;
pub mod types;

pub use app::{router, AppState};
pub use gate::{AccessGate, GateError};
pub use types::{Decision, Pid, ProtectedPath};
