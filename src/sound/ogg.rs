//! Ogg Vorbis header parsing
//!
//! Uses the `lewton` crate to read the identification header; the audio
//! packets themselves are left encoded.

use std::io::Cursor;

use lewton::inside_ogg::OggStreamReader;

use crate::resource::error::DecodeError;

/// Parsed Vorbis identification header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OggInfo {
    pub channels: u16,
    pub sample_rate: u32,
}

pub fn parse_ogg(data: &[u8]) -> Result<OggInfo, DecodeError> {
    let reader = OggStreamReader::new(Cursor::new(data)).map_err(|e| {
        DecodeError::InvalidData(format!("Failed to open Ogg stream: {:?}", e))
    })?;

    Ok(OggInfo {
        channels: reader.ident_hdr.audio_channels as u16,
        sample_rate: reader.ident_hdr.audio_sample_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_ogg() {
        assert!(parse_ogg(b"RIFF not an ogg stream").is_err());
    }

    #[test]
    fn test_rejects_truncated_capture() {
        assert!(parse_ogg(b"OggS\0\x02").is_err());
    }
}
