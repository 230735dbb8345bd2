pub mod event;
pub mod host;
pub mod memory_host;
pub mod timer;
