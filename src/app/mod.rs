//! Host application: shared state and the demo match driver

pub mod demo;
pub mod state;

pub use state::AppState;
