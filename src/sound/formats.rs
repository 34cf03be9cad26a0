//! Audio format definitions for decoded clips

use std::fmt;

/// PCM sample layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    /// 8-bit mono (1 byte per sample)
    Mono8,
    /// 16-bit mono (2 bytes per sample)
    Mono16,
    /// 8-bit stereo (2 bytes per sample)
    Stereo8,
    /// 16-bit stereo (4 bytes per sample)
    Stereo16,
}

impl AudioFormat {
    /// Layout for a channel count and bit depth, if supported
    pub fn from_layout(channels: u16, bits_per_sample: u16) -> Option<Self> {
        match (channels, bits_per_sample) {
            (1, 8) => Some(AudioFormat::Mono8),
            (2, 8) => Some(AudioFormat::Stereo8),
            (1, 16) => Some(AudioFormat::Mono16),
            (2, 16) => Some(AudioFormat::Stereo16),
            _ => None,
        }
    }

    /// Returns the number of bytes per sample frame
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            AudioFormat::Mono8 => 1,
            AudioFormat::Stereo8 => 2,
            AudioFormat::Mono16 => 2,
            AudioFormat::Stereo16 => 4,
        }
    }

    /// Returns the number of channels
    pub fn channels(&self) -> u16 {
        match self {
            AudioFormat::Mono8 | AudioFormat::Mono16 => 1,
            AudioFormat::Stereo8 | AudioFormat::Stereo16 => 2,
        }
    }
}

/// Encoded container the clip bytes are stored in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioContainer {
    Wav,
    OggVorbis,
}

impl AudioContainer {
    /// Container for a file extension (case-insensitive)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "wav" | "wave" => Some(AudioContainer::Wav),
            "ogg" | "oga" => Some(AudioContainer::OggVorbis),
            _ => None,
        }
    }

    /// Container from magic bytes at the start of the data
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WAVE" {
            Some(AudioContainer::Wav)
        } else if data.len() >= 4 && &data[0..4] == b"OggS" {
            Some(AudioContainer::OggVorbis)
        } else {
            None
        }
    }
}

impl fmt::Display for AudioContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioContainer::Wav => write!(f, "wav"),
            AudioContainer::OggVorbis => write!(f, "ogg"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_layout() {
        assert_eq!(AudioFormat::from_layout(2, 16), Some(AudioFormat::Stereo16));
        assert_eq!(AudioFormat::from_layout(1, 8), Some(AudioFormat::Mono8));
        assert_eq!(AudioFormat::from_layout(6, 16), None);
    }

    #[test]
    fn test_bytes_per_sample() {
        assert_eq!(AudioFormat::Mono8.bytes_per_sample(), 1);
        assert_eq!(AudioFormat::Stereo16.bytes_per_sample(), 4);
        assert_eq!(AudioFormat::Stereo8.channels(), 2);
    }

    #[test]
    fn test_container_detection() {
        assert_eq!(AudioContainer::from_extension("OGG"), Some(AudioContainer::OggVorbis));
        assert_eq!(AudioContainer::from_extension("mp3"), None);
        assert_eq!(AudioContainer::sniff(b"OggS\0\0"), Some(AudioContainer::OggVorbis));
        assert_eq!(AudioContainer::sniff(b"RIFF\0\0\0\0WAVEfmt "), Some(AudioContainer::Wav));
        assert_eq!(AudioContainer::sniff(b"ID3"), None);
    }
}
