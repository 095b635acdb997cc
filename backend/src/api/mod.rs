pub mod channel;
pub mod image;
pub mod message;
pub mod session;
pub mod tools;
pub mod user;

pub use channel::*;
pub use image::*;
pub use message::*;
pub use session::*;
pub use tools::*;
pub use user::*;
