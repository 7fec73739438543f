pub mod document;
pub mod errors;
pub mod event;
pub mod position;
