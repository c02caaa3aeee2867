use std::fs::{self, File};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::error::ExportError;
use crate::models::record::DecodedAudio;
use crate::processing::wav_format;

/// Streaming 16-bit PCM WAV file writer.
///
/// ## File Format
///
/// ```text
/// [44-byte WAV header]
/// [raw 16-bit PCM data...]
/// ```
///
/// The header is written with a zero data size on `open` and rewritten with
/// the real sizes on `close`. An existing file at the path is truncated.
pub struct WavFileWriter {
    file_path: PathBuf,
    file: Option<BufWriter<File>>,
    sample_rate: u32,
    channels: u16,
    total_bytes_written: u64,
}

/// What `WavFileWriter::close` reports about the finished file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenWav {
    pub bytes_written: u64,
    pub checksum: String,
}

impl WavFileWriter {
    pub fn new(file_path: PathBuf) -> Self {
        Self {
            file_path,
            file: None,
            sample_rate: 0,
            channels: 0,
            total_bytes_written: 0,
        }
    }

    /// Create the file and write the initial 44-byte WAV header.
    pub fn open(&mut self, sample_rate: u32, channels: u16) -> Result<(), ExportError> {
        if self.file.is_some() {
            return Ok(());
        }
        wav_format::check_pcm_format(sample_rate, channels, 0).map_err(ExportError::WriteFailed)?;

        let file = File::create(&self.file_path).map_err(|e| {
            ExportError::WriteFailed(format!("failed to create {}: {}", self.file_path.display(), e))
        })?;
        self.file = Some(BufWriter::new(file));
        self.sample_rate = sample_rate;
        self.channels = channels;
        self.total_bytes_written = 0;

        let header = wav_format::generate_wav_header(sample_rate, wav_format::PCM_BIT_DEPTH, channels, 0);
        self.write_raw(&header)
    }

    /// Append f32 samples as 16-bit PCM.
    pub fn write_samples(&mut self, samples: &[f32]) -> Result<(), ExportError> {
        if self.file.is_none() {
            return Err(ExportError::WriteFailed("file is not open for writing".into()));
        }
        let pcm = wav_format::convert_to_int16_pcm(samples);
        self.write_raw(&pcm)
    }

    /// Finalize the file: rewrite the header with real sizes, return the SHA-256 checksum.
    pub fn close(&mut self) -> Result<WrittenWav, ExportError> {
        let mut file = self
            .file
            .take()
            .ok_or_else(|| ExportError::WriteFailed("file is not open".into()))?;

        let data_size = self.total_bytes_written - wav_format::WAV_HEADER_SIZE as u64;
        let data_size_u32 = u32::try_from(data_size)
            .map_err(|_| ExportError::WriteFailed(format!("{} bytes of audio exceed the WAV size limit", data_size)))?;
        let header =
            wav_format::generate_wav_header(self.sample_rate, wav_format::PCM_BIT_DEPTH, self.channels, data_size_u32);

        file.seek(SeekFrom::Start(0))
            .map_err(|e| ExportError::WriteFailed(e.to_string()))?;
        file.write_all(&header)
            .map_err(|e| ExportError::WriteFailed(e.to_string()))?;
        file.flush().map_err(|e| ExportError::WriteFailed(e.to_string()))?;

        let checksum = sha256_file(&self.file_path)?;

        Ok(WrittenWav {
            bytes_written: self.total_bytes_written,
            checksum,
        })
    }

    /// Total bytes written so far (including WAV header).
    pub fn bytes_written(&self) -> u64 {
        self.total_bytes_written
    }

    /// Path of the output file.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<(), ExportError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| ExportError::WriteFailed("file is not open".into()))?;
        file.write_all(data)
            .map_err(|e| ExportError::WriteFailed(format!("write failed: {}", e)))?;
        self.total_bytes_written += data.len() as u64;
        Ok(())
    }
}

/// Write `audio` to `path` as a complete WAV file, replacing any existing file.
///
/// A file this call created is removed again if writing it fails part way.
pub fn write_wav_file(path: &Path, audio: &DecodedAudio) -> Result<WrittenWav, ExportError> {
    wav_format::check_pcm_format(audio.sample_rate, audio.channels, audio.samples.len())
        .map_err(ExportError::WriteFailed)?;

    let mut writer = WavFileWriter::new(path.to_path_buf());
    writer.open(audio.sample_rate, audio.channels)?;

    let result = writer.write_samples(&audio.samples).and_then(|_| writer.close());
    if result.is_err() {
        drop(writer);
        if let Err(e) = fs::remove_file(path) {
            log::warn!("failed to remove partial file {}: {}", path.display(), e);
        }
    }
    result
}

/// Compute SHA-256 hex digest of a file.
fn sha256_file(path: &Path) -> Result<String, ExportError> {
    let data = fs::read(path)
        .map_err(|e| ExportError::WriteFailed(format!("failed to read file for checksum: {}", e)))?;
    let digest = Sha256::digest(&data);
    Ok(hex_encode(&digest))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
