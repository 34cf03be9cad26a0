//! Audio clips
//!
//! A clip keeps the encoded bytes of its container together with the header
//! metadata needed to schedule playback. Sample decoding is the mixer's job.

use std::fmt;

use super::formats::{AudioContainer, AudioFormat};
use super::{ogg, wav};
use crate::resource::error::DecodeError;

#[derive(Clone, PartialEq)]
pub struct AudioClip {
    container: AudioContainer,
    channels: u16,
    sample_rate: u32,
    /// PCM layout, known for WAV only
    pcm_format: Option<AudioFormat>,
    /// Duration in seconds, known for WAV only
    length: Option<f32>,
    data: Vec<u8>,
}

impl AudioClip {
    pub fn container(&self) -> AudioContainer {
        self.container
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn pcm_format(&self) -> Option<AudioFormat> {
        self.pcm_format
    }

    pub fn length(&self) -> Option<f32> {
        self.length
    }

    /// The encoded file bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Debug for AudioClip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioClip")
            .field("container", &self.container)
            .field("channels", &self.channels)
            .field("sample_rate", &self.sample_rate)
            .field("length", &self.length)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Build a clip from encoded bytes.
///
/// The container is picked from the extension hint, falling back to magic
/// bytes when the hint is not an audio extension.
pub fn decode_audio(bytes: &[u8], hint: &str) -> Result<AudioClip, DecodeError> {
    let container = AudioContainer::from_extension(hint)
        .or_else(|| AudioContainer::sniff(bytes))
        .ok_or_else(|| DecodeError::UnsupportedFormat(format!("audio '{}'", hint)))?;

    match container {
        AudioContainer::Wav => {
            let info = wav::parse_wav(bytes)?;
            Ok(AudioClip {
                container,
                channels: info.format.channels(),
                sample_rate: info.sample_rate,
                pcm_format: Some(info.format),
                length: Some(info.length),
                data: bytes.to_vec(),
            })
        }
        AudioContainer::OggVorbis => {
            let info = ogg::parse_ogg(bytes)?;
            Ok(AudioClip {
                container,
                channels: info.channels,
                sample_rate: info.sample_rate,
                pcm_format: None,
                length: None,
                data: bytes.to_vec(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound::wav::encode_pcm_wav;

    #[test]
    fn test_decode_wav_clip() {
        let bytes = encode_pcm_wav(AudioFormat::Stereo16, 44100, &[0u8; 4410 * 4]);
        let clip = decode_audio(&bytes, "wav").unwrap();

        assert_eq!(clip.container(), AudioContainer::Wav);
        assert_eq!(clip.channels(), 2);
        assert_eq!(clip.sample_rate(), 44100);
        assert_eq!(clip.pcm_format(), Some(AudioFormat::Stereo16));
        assert!((clip.length().unwrap() - 0.1).abs() < 1e-4);
        assert_eq!(clip.data(), &bytes[..]);
    }

    #[test]
    fn test_sniffs_when_hint_is_not_audio() {
        let bytes = encode_pcm_wav(AudioFormat::Mono8, 8000, &[128u8; 80]);
        let clip = decode_audio(&bytes, "sfx").unwrap();
        assert_eq!(clip.container(), AudioContainer::Wav);
    }

    #[test]
    fn test_unknown_audio_fails() {
        let err = decode_audio(b"ID3\x03", "mp3").unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedFormat(_)));
    }
}
