pub mod builder;
pub mod candidates;
pub mod config;
pub mod error;
pub mod estimator;
pub mod evaluator;
pub mod optimizer;
pub mod pairwise;
pub mod predictor;
pub mod types;
// cmd and reports belong to the binary (main.rs).
