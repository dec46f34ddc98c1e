pub mod list;
pub mod scan;
