pub mod compatibility;
pub mod diff;
pub mod migration;
