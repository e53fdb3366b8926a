pub mod admission;
pub mod config;
pub mod database;
pub mod error;
pub mod executor;
pub mod logging;
pub mod messages;
pub mod relay;
pub mod router;
pub mod schema;

// Re-export them for easier access from main.rs
pub use admission::*;
pub use config::*;
pub use database::*;
pub use error::*;
pub use executor::*;
pub use logging::*;
pub use messages::*;
pub use relay::*;
pub use router::*;
pub use schema::*;
