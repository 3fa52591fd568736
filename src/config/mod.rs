pub mod projection;
pub mod settings;

pub use projection::*;
pub use settings::*;
