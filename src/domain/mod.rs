pub mod cleaning;
pub mod data_file;
pub mod error;
pub mod statistics;
pub mod table;
