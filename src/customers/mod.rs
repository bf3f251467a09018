pub mod handlers;
pub mod models;
pub mod service;
pub mod verification;

pub use handlers::*;
pub use models::*;
pub use service::*;
pub use verification::*;
