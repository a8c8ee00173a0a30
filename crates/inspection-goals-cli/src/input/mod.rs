pub mod file;
pub mod settings;
pub mod sheets;
pub mod stdin;
