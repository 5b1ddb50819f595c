pub mod estimator;
pub mod pricing;
