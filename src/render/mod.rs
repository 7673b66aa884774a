pub mod backend;
pub(crate) mod cpu;
pub mod text;
