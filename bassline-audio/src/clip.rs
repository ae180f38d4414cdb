//! Decoded audio clips.

use bassline_core::{BasslineError, Result};

/// PCM16 audio held in memory, ready for playback and onset analysis.
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioClip {
    /// Content length in seconds.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / (self.sample_rate as f32 * self.channels as f32)
    }

    /// Parses a RIFF/WAVE byte stream containing PCM16 data.
    ///
    /// Walks the chunk list for `fmt ` and `data`; anything other than
    /// 16-bit integer PCM is rejected.
    pub fn from_wav(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
            return Err(BasslineError::DecodeError("not a RIFF/WAVE stream".into()));
        }

        let mut sample_rate = 0u32;
        let mut channels = 0u16;
        let mut bits = 0u16;
        let mut data: Option<&[u8]> = None;

        let mut idx = 12;
        while idx + 8 <= bytes.len() {
            let chunk_id = &bytes[idx..idx + 4];
            let sz = u32::from_le_bytes([
                bytes[idx + 4],
                bytes[idx + 5],
                bytes[idx + 6],
                bytes[idx + 7],
            ]) as usize;
            let body_start = idx + 8;
            let body_end = body_start
                .checked_add(sz)
                .filter(|&end| end <= bytes.len())
                .ok_or_else(|| BasslineError::DecodeError("truncated WAVE chunk".into()))?;

            match chunk_id {
                b"fmt " => {
                    let body = &bytes[body_start..body_end];
                    if body.len() < 16 {
                        return Err(BasslineError::DecodeError("short fmt chunk".into()));
                    }
                    let format_tag = u16::from_le_bytes([body[0], body[1]]);
                    if format_tag != 1 {
                        return Err(BasslineError::DecodeError(format!(
                            "unsupported WAVE format tag {format_tag}"
                        )));
                    }
                    channels = u16::from_le_bytes([body[2], body[3]]);
                    sample_rate = u32::from_le_bytes([body[4], body[5], body[6], body[7]]);
                    bits = u16::from_le_bytes([body[14], body[15]]);
                }
                b"data" => {
                    data = Some(&bytes[body_start..body_end]);
                }
                _ => {}
            }
            // Chunk bodies are word-aligned.
            idx = body_end + (sz & 1);
        }

        if sample_rate == 0 || channels == 0 {
            return Err(BasslineError::DecodeError("missing fmt chunk".into()));
        }
        if bits != 16 {
            return Err(BasslineError::DecodeError(format!(
                "unsupported bit depth {bits}"
            )));
        }
        let data = data.ok_or_else(|| BasslineError::DecodeError("missing data chunk".into()))?;

        let mut samples = Vec::with_capacity(data.len() / 2);
        for pair in data.chunks_exact(2) {
            samples.push(i16::from_le_bytes([pair[0], pair[1]]));
        }
        Ok(Self {
            samples,
            sample_rate,
            channels,
        })
    }
}
