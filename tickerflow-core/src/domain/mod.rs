//! Domain types for TickerFlow

pub mod bar;
pub mod security;

pub use bar::Bar;
pub use security::ListedSecurity;
