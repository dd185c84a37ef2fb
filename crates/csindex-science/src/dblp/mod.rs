pub mod parser;
pub mod source;

pub use parser::parse_person_records;
pub use source::DblpSource;
