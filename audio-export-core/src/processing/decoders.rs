//! Decode strategies for the exporter.

use std::fs::File;
use std::io::{Cursor, ErrorKind};
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::models::error::ExportError;
use crate::models::record::{AudioPayload, DecodedAudio, Record};
use crate::processing::wav_format;
use crate::traits::audio_decoder::AudioDecoder;

/// Uses the samples the dataset provider decoded; anything else fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodedOnly;

impl AudioDecoder for DecodedOnly {
    fn decode(&self, record: &Record) -> Result<DecodedAudio, ExportError> {
        match &record.payload {
            AudioPayload::Decoded(audio) => Ok(audio.clone()),
            AudioPayload::Encoded { .. } | AudioPayload::File(_) => Err(ExportError::DecodeFailed(
                "record carries undecoded audio and no decoder is configured".into(),
            )),
        }
    }

    fn name(&self) -> &str {
        "decoded-only"
    }
}

/// Decodes raw container bytes or files with Symphonia.
///
/// Already-decoded payloads pass through. With `downmix` set (the default),
/// multi-channel audio is averaged to mono.
#[derive(Debug, Clone, Copy)]
pub struct SymphoniaDecoder {
    pub downmix: bool,
}

impl SymphoniaDecoder {
    pub fn new(downmix: bool) -> Self {
        Self { downmix }
    }

    fn finish(&self, mut audio: DecodedAudio) -> DecodedAudio {
        if self.downmix && audio.channels > 1 {
            audio.samples = wav_format::downmix_to_mono(&audio.samples, audio.channels as usize);
            audio.channels = 1;
        }
        audio
    }
}

impl Default for SymphoniaDecoder {
    fn default() -> Self {
        Self { downmix: true }
    }
}

impl AudioDecoder for SymphoniaDecoder {
    fn decode(&self, record: &Record) -> Result<DecodedAudio, ExportError> {
        let audio = match &record.payload {
            AudioPayload::Decoded(audio) => audio.clone(),
            AudioPayload::Encoded { bytes, hint } => {
                if bytes.is_empty() {
                    return Err(ExportError::DecodeFailed("empty audio payload".into()));
                }
                let extension = hint.as_deref().and_then(extension_of);
                decode_stream(Box::new(Cursor::new(bytes.clone())), extension)?
            }
            AudioPayload::File(path) => {
                let file = File::open(path).map_err(|e| {
                    ExportError::DecodeFailed(format!("failed to open {}: {}", path.display(), e))
                })?;
                let extension = path.to_str().and_then(extension_of);
                decode_stream(Box::new(file), extension)?
            }
        };
        Ok(self.finish(audio))
    }

    fn name(&self) -> &str {
        "symphonia"
    }
}

fn extension_of(name: &str) -> Option<&str> {
    Path::new(name).extension().and_then(|ext| ext.to_str())
}

/// Probe the container, decode its first audio track, and collect interleaved f32 samples.
fn decode_stream(source: Box<dyn MediaSource>, extension: Option<&str>) -> Result<DecodedAudio, ExportError> {
    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let stream = MediaSourceStream::new(source, Default::default());
    let probed = symphonia::default::get_probe()
        .format(&hint, stream, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| ExportError::DecodeFailed(format!("unrecognized audio container: {}", e)))?;
    let mut format = probed.format;

    let (track_id, codec_params) = {
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| ExportError::DecodeFailed("no decodable audio track".into()))?;
        (track.id, track.codec_params.clone())
    };

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| ExportError::DecodeFailed(format!("unsupported codec: {}", e)))?;

    let mut sample_rate = codec_params.sample_rate;
    let mut channels = codec_params.channels.map(|c| c.count() as u16);
    let mut samples = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(ExportError::DecodeFailed(format!("failed to read packet: {}", e))),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate.get_or_insert(spec.rate);
                channels.get_or_insert(spec.channels.count() as u16);

                let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buffer.copy_interleaved_ref(decoded);
                samples.extend_from_slice(buffer.samples());
            }
            Err(SymphoniaError::DecodeError(e)) => {
                log::debug!("skipping corrupt packet: {}", e);
            }
            Err(e) => return Err(ExportError::DecodeFailed(format!("decoder error: {}", e))),
        }
    }

    let sample_rate = sample_rate.ok_or_else(|| ExportError::DecodeFailed("unknown sample rate".into()))?;
    let channels = channels.unwrap_or(1).max(1);

    Ok(DecodedAudio {
        samples,
        sample_rate,
        channels,
    })
}
