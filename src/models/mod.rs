pub mod chat;
pub mod image;
pub mod video;

pub use chat::*;
pub use image::*;
pub use video::*;
