//! Admin and public search HTTP surface for the search control plane.

pub mod admin;
pub mod envelope;
pub mod http;
pub mod search;
pub mod state;

pub use http::create_router;
pub use state::AppState;
