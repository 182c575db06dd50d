pub mod enums;
pub mod document;
pub mod evidence;
pub mod analysis;

pub use enums::*;
pub use document::*;
pub use evidence::*;
pub use analysis::*;
