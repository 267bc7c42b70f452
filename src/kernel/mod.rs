pub mod channel;
pub mod driver;
pub mod event;
pub mod message;
pub mod session;
pub mod suggestions;
pub mod telemetry;
pub mod workbench;
