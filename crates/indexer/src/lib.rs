pub mod handlers;
pub mod parser;
pub mod scan;
pub mod walk;
