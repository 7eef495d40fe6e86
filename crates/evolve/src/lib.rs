pub mod evolver;
pub mod rules;
