pub mod advice;
pub mod batch;
pub mod orchestrator;
