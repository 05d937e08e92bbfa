pub mod fitting;
pub mod operations;
