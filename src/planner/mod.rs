pub mod executor;
pub mod goal;
pub mod types;
