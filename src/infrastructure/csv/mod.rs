// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// Byte decoding and delimited-text parsing

mod csv_parser;

pub use csv_parser::{decode_bytes, read_text_file, CsvParser, CsvTable};
