use std::path::PathBuf;

/// Decoded audio: interleaved f32 samples at a fixed rate.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl DecodedAudio {
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            channels: 1,
        }
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// Audio carried by a dataset record.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioPayload {
    /// Samples the dataset provider already decoded.
    Decoded(DecodedAudio),

    /// Raw container bytes (WAV, FLAC, MP3, ...) still to be decoded.
    /// `hint` is the original file name, used to guess the container.
    Encoded { bytes: Vec<u8>, hint: Option<String> },

    /// An undecoded audio file on local disk.
    File(PathBuf),
}

/// One labeled dataset entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub label: String,
    pub payload: AudioPayload,
    /// Where the record came from (e.g. `train-00000.parquet#17`), for logs.
    pub source_id: Option<String>,
}

impl Record {
    pub fn decoded(label: impl Into<String>, samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            label: label.into(),
            payload: AudioPayload::Decoded(DecodedAudio::mono(samples, sample_rate)),
            source_id: None,
        }
    }

    pub fn encoded(label: impl Into<String>, bytes: Vec<u8>, hint: Option<String>) -> Self {
        Self {
            label: label.into(),
            payload: AudioPayload::Encoded { bytes, hint },
            source_id: None,
        }
    }

    pub fn from_file(label: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            payload: AudioPayload::File(path.into()),
            source_id: None,
        }
    }

    pub fn with_source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_and_duration() {
        let audio = DecodedAudio {
            samples: vec![0.0; 32000],
            sample_rate: 16000,
            channels: 2,
        };
        assert_eq!(audio.frames(), 16000);
        approx::assert_relative_eq!(audio.duration_secs(), 1.0);
    }

    #[test]
    fn zero_rate_has_zero_duration() {
        let audio = DecodedAudio::mono(vec![0.1, 0.2], 0);
        assert_eq!(audio.duration_secs(), 0.0);
    }
}
