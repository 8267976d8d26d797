pub mod device;
pub mod synthetic;
