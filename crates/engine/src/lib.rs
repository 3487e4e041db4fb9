pub mod compiler;
pub mod media;
pub mod probe;
pub mod prompts;
pub mod render;
pub mod request;

pub use compiler::*;
pub use media::*;
pub use request::*;
