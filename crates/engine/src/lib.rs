pub mod engine;
pub mod frame;
pub mod settings;
pub mod view;

pub use engine::*;
pub use frame::*;
pub use settings::*;
pub use view::*;
