pub mod matcher;
pub mod portfolio;
pub mod service;
