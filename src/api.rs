pub mod errors;
pub mod requests;
pub mod responses;
pub mod routes;
