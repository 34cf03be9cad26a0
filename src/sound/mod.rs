// Sound Module
// Audio clip values and the container header parsers behind them

pub mod clip;
pub mod formats;
pub mod ogg;
pub mod wav;

pub use clip::{decode_audio, AudioClip};
pub use formats::{AudioContainer, AudioFormat};
