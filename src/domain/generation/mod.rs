//! Generation domain - The opaque content generation contract

mod generator;
mod provider;
mod request;

pub use generator::ContentGenerator;
pub use provider::Provider;
pub use request::{GenerationRequest, GenerationResponse, GenerationScope, GenerationSettings};

#[cfg(test)]
pub use generator::mock;
#[cfg(test)]
pub use generator::MockContentGenerator;
