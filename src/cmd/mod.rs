pub mod order;
pub mod sweep;
