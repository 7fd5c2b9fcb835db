pub mod classifier;
pub mod identity;
pub mod scanner;
pub mod screen_model;
pub mod selector;
