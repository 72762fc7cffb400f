pub mod job;
pub mod parser;
pub mod variable_expansion;
pub mod variables;
