// ============================================================
// TABULAR INFRASTRUCTURE LAYER
// ============================================================
// Format detection, file loading and serialisation of tables

mod format;
mod reader;
mod writer;

pub use format::{extension_of, TabularFormat};
pub use reader::TabularReader;
pub use writer::TableWriter;
