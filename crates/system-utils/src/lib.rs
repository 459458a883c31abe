pub mod privilege;
pub mod process;
