pub mod use_cases;

pub use use_cases::data_cleaner::DataCleaner;
pub use use_cases::data_files::{CleaningOutcome, DataFileUseCase, StatisticsOutcome};
pub use use_cases::statistics::StatisticsEngine;
