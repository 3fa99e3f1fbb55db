pub mod handlers;
pub mod middleware;
pub mod router;
pub mod utils;

pub use router::build_router;
