pub mod dtos;
pub mod handlers;
pub mod routes;

pub use routes::routes;
