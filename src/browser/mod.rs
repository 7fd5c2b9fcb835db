pub mod driver;
pub mod error;
pub mod wait;
pub mod webdriver;
