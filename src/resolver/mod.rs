pub mod candidates;
pub mod resolver;
pub mod scoring;
pub mod strategies;
