// Graphics Module
// Texture values produced by the image decoder

pub mod texture;

pub use texture::{decode_texture, Texture};
