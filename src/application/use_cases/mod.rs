pub mod data_cleaner;
pub mod data_files;
pub mod statistics;
