pub mod batch;
pub mod factory;
