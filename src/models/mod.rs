pub mod activity;
pub mod display;
pub mod profile;
pub mod summary;
