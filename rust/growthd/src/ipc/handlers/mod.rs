pub mod core;
pub mod import;
pub mod rewards;
pub mod students;
pub mod views;
