pub mod migrate;
pub mod research_record;
pub mod research_schema;

pub use research_record::{insert_record, load_records, ResearchRecord};
pub use research_schema::initiate_tables;
