pub mod catalog;
pub mod config;
pub mod error;
pub mod kernel;
pub mod planner;
pub mod services;

// Re-export the entry points most callers need
pub use catalog::{Capability, CapabilityCatalog};
pub use config::WorkbenchConfig;
pub use error::{WorkbenchError, WorkbenchResult};
pub use kernel::driver::Driver;
pub use kernel::workbench::Workbench;
