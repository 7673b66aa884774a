pub mod damping;
pub mod model;
pub mod preset;
pub mod render;
pub mod sparkline;
pub mod zones;
