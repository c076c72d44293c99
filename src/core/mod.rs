// Core modules for the record model, the shared message log, and error modeling.
pub mod error;
pub mod messages;
pub mod pop;
