mod chat;
mod citation;
mod place;
mod response;

pub use chat::*;
pub use citation::*;
pub use place::*;
pub use response::*;
