//! Generation infrastructure - HTTP-backed content generator

mod http_client;
mod http_generator;

pub use http_client::{HttpClient, HttpClientTrait};
pub use http_generator::HttpGenerator;
