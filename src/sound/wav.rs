//! WAV header parsing
//!
//! Reads the RIFF/WAVE chunk structure far enough to describe a clip:
//! - 8-bit and 16-bit PCM
//! - Mono and stereo
//! - Any sample rate

use std::io::{Cursor, Read, Seek, SeekFrom};

use super::formats::AudioFormat;
use crate::resource::error::DecodeError;

// WAV format constants (little-endian IDs)
const RIFF_ID: u32 = 0x46464952; // "RIFF"
const WAVE_ID: u32 = 0x45564157; // "WAVE"
const FMT_ID: u32 = 0x20746d66; // "fmt "
const DATA_ID: u32 = 0x61746164; // "data"

// WAV format codes
const WAVE_FORMAT_PCM: u16 = 1;

/// Parsed description of a WAV stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavInfo {
    pub format: AudioFormat,
    pub sample_rate: u32,
    /// Offset of the PCM payload within the file
    pub data_offset: usize,
    /// Size of the PCM payload in bytes
    pub data_size: usize,
    /// Duration in seconds
    pub length: f32,
}

fn read_le_u16(cursor: &mut Cursor<&[u8]>) -> Result<u16, DecodeError> {
    let mut buf = [0u8; 2];
    cursor
        .read_exact(&mut buf)
        .map_err(|e| DecodeError::InvalidData(format!("Failed to read u16: {}", e)))?;
    Ok(u16::from_le_bytes(buf))
}

fn read_le_u32(cursor: &mut Cursor<&[u8]>) -> Result<u32, DecodeError> {
    let mut buf = [0u8; 4];
    cursor
        .read_exact(&mut buf)
        .map_err(|e| DecodeError::InvalidData(format!("Failed to read u32: {}", e)))?;
    Ok(u32::from_le_bytes(buf))
}

fn skip(cursor: &mut Cursor<&[u8]>, bytes: u32) -> Result<(), DecodeError> {
    cursor
        .seek(SeekFrom::Current(bytes as i64))
        .map(|_| ())
        .map_err(|e| DecodeError::InvalidData(format!("Failed to skip chunk: {}", e)))
}

/// Parse the RIFF header and locate the `fmt ` and `data` chunks.
pub fn parse_wav(data: &[u8]) -> Result<WavInfo, DecodeError> {
    let mut cursor = Cursor::new(data);

    let id = read_le_u32(&mut cursor)?;
    let _size = read_le_u32(&mut cursor)?;
    let wave = read_le_u32(&mut cursor)?;
    if id != RIFF_ID {
        return Err(DecodeError::InvalidData("Not a RIFF file".to_string()));
    }
    if wave != WAVE_ID {
        return Err(DecodeError::InvalidData("Not a WAVE file".to_string()));
    }

    let mut layout: Option<(AudioFormat, u32)> = None;
    let mut data_chunk: Option<(usize, u32)> = None;

    while (cursor.position() as usize) < data.len() {
        let chunk_id = read_le_u32(&mut cursor)?;
        let chunk_size = read_le_u32(&mut cursor)?;

        match chunk_id {
            FMT_ID => {
                if chunk_size < 16 {
                    return Err(DecodeError::InvalidData(
                        "Format chunk too small".to_string(),
                    ));
                }
                let format = read_le_u16(&mut cursor)?;
                let channels = read_le_u16(&mut cursor)?;
                let sample_rate = read_le_u32(&mut cursor)?;
                let _byte_rate = read_le_u32(&mut cursor)?;
                let _block_align = read_le_u16(&mut cursor)?;
                let bits_per_sample = read_le_u16(&mut cursor)?;
                if chunk_size > 16 {
                    skip(&mut cursor, chunk_size - 16)?;
                }

                if format != WAVE_FORMAT_PCM {
                    return Err(DecodeError::UnsupportedFormat(format!(
                        "WAV format {} (only PCM supported)",
                        format
                    )));
                }
                let audio_format =
                    AudioFormat::from_layout(channels, bits_per_sample).ok_or_else(|| {
                        DecodeError::UnsupportedFormat(format!(
                            "{} channels at {} bits",
                            channels, bits_per_sample
                        ))
                    })?;
                layout = Some((audio_format, sample_rate));
            }
            DATA_ID => {
                data_chunk = Some((cursor.position() as usize, chunk_size));
                break;
            }
            _ => skip(&mut cursor, chunk_size)?,
        }
    }

    let (format, sample_rate) =
        layout.ok_or_else(|| DecodeError::InvalidData("No format chunk found".to_string()))?;
    let (data_offset, declared) = data_chunk
        .filter(|(_, size)| *size > 0)
        .ok_or_else(|| DecodeError::InvalidData("No data chunk found".to_string()))?;

    let data_size = (declared as usize).min(data.len().saturating_sub(data_offset));
    let frames = data_size / format.bytes_per_sample();
    let length = if sample_rate == 0 {
        0.0
    } else {
        frames as f32 / sample_rate as f32
    };

    Ok(WavInfo {
        format,
        sample_rate,
        data_offset,
        data_size,
        length,
    })
}

/// Build a minimal PCM WAV file (used by tests and tooling)
pub fn encode_pcm_wav(format: AudioFormat, sample_rate: u32, pcm: &[u8]) -> Vec<u8> {
    let channels = format.channels();
    let bits: u16 = match format {
        AudioFormat::Mono8 | AudioFormat::Stereo8 => 8,
        AudioFormat::Mono16 | AudioFormat::Stereo16 => 16,
    };
    let block_align = format.bytes_per_sample() as u16;
    let byte_rate = sample_rate * block_align as u32;

    let mut out = Vec::with_capacity(44 + pcm.len());
    out.extend_from_slice(&RIFF_ID.to_le_bytes());
    out.extend_from_slice(&(36 + pcm.len() as u32).to_le_bytes());
    out.extend_from_slice(&WAVE_ID.to_le_bytes());
    out.extend_from_slice(&FMT_ID.to_le_bytes());
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&WAVE_FORMAT_PCM.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&bits.to_le_bytes());
    out.extend_from_slice(&DATA_ID.to_le_bytes());
    out.extend_from_slice(&(pcm.len() as u32).to_le_bytes());
    out.extend_from_slice(pcm);
    out
}
