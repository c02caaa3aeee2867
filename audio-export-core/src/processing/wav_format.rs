//! WAV file format utilities.
//!
//! Generates standard 44-byte RIFF WAV headers and converts float samples
//! to the 16-bit PCM payload every exported file uses.

/// Size of the standard WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Bit depth of exported files.
pub const PCM_BIT_DEPTH: u16 = 16;

/// Generate a 44-byte WAV RIFF header.
///
/// Format: PCM (format code 1), little-endian.
///
/// Layout:
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    file size - 8 (36 + data_size)
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (PCM format chunk size)
/// [20-21]  1 (PCM format code)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate = sample_rate * block_align
/// [32-33]  block_align = channels * (bit_depth / 8)
/// [34-35]  bit_depth
/// [36-39]  "data"
/// [40-43]  data_size
/// ```
///
/// Values that do not fit their field saturate; `check_pcm_format` rejects
/// such formats before a header is written.
pub fn generate_wav_header(
    sample_rate: u32,
    bit_depth: u16,
    channels: u16,
    data_size: u32,
) -> [u8; WAV_HEADER_SIZE] {
    let block_align = channels as u64 * (bit_depth / 8) as u64;
    let byte_rate = u32::try_from(sample_rate as u64 * block_align).unwrap_or(u32::MAX);
    let block_align = u16::try_from(block_align).unwrap_or(u16::MAX);
    let chunk_size = data_size.saturating_add(36);

    let mut header = [0u8; WAV_HEADER_SIZE];

    // RIFF chunk descriptor
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&chunk_size.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    // fmt sub-chunk
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes()); // PCM format size
    header[20..22].copy_from_slice(&1u16.to_le_bytes()); // PCM format code
    header[22..24].copy_from_slice(&channels.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&bit_depth.to_le_bytes());

    // data sub-chunk
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}

/// Check that a 16-bit PCM stream with these parameters fits in a WAV header.
pub fn check_pcm_format(sample_rate: u32, channels: u16, sample_count: usize) -> Result<(), String> {
    if sample_rate == 0 {
        return Err("sample rate must be positive".into());
    }
    if channels == 0 {
        return Err("channel count must be positive".into());
    }
    if sample_count % channels as usize != 0 {
        return Err(format!(
            "{} samples do not divide into {} channels",
            sample_count, channels
        ));
    }
    let bytes_per_sample = (PCM_BIT_DEPTH / 8) as u64;
    let block_align = channels as u64 * bytes_per_sample;
    if block_align > u16::MAX as u64 {
        return Err(format!("{} channels exceed the WAV block size limit", channels));
    }
    if sample_rate as u64 * block_align > u32::MAX as u64 {
        return Err(format!(
            "byte rate overflows for {} Hz x {} channels",
            sample_rate, channels
        ));
    }
    let data_size = sample_count as u64 * bytes_per_sample;
    if data_size + (WAV_HEADER_SIZE as u64 - 8) > u32::MAX as u64 {
        return Err(format!("{} bytes of audio exceed the WAV size limit", data_size));
    }
    Ok(())
}

/// Convert f32 samples `[-1.0, 1.0]` to 16-bit PCM (little-endian bytes).
///
/// Clamps out-of-range values and rounds to the nearest step, so a sample
/// of `k / 32767.0` comes back as exactly `k`.
pub fn convert_to_int16_pcm(samples: &[f32]) -> Vec<u8> {
    let mut data = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let clamped = if sample.is_nan() { 0.0 } else { sample.clamp(-1.0, 1.0) };
        let int16_value = (clamped * i16::MAX as f32).round() as i16;
        data.extend_from_slice(&int16_value.to_le_bytes());
    }
    data
}

/// Encode samples as a complete in-memory 16-bit PCM WAV file.
pub fn encode_pcm16_wav(samples: &[f32], sample_rate: u32, channels: u16) -> Result<Vec<u8>, String> {
    check_pcm_format(sample_rate, channels, samples.len())?;
    let pcm = convert_to_int16_pcm(samples);
    let header = generate_wav_header(sample_rate, PCM_BIT_DEPTH, channels, pcm.len() as u32);

    let mut wav = Vec::with_capacity(WAV_HEADER_SIZE + pcm.len());
    wav.extend_from_slice(&header);
    wav.extend_from_slice(&pcm);
    Ok(wav)
}

/// Downmix interleaved multi-channel audio to mono by averaging channels per frame.
pub fn downmix_to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let frame_count = samples.len() / channels;
    let scale = 1.0 / channels as f32;
    let mut mono = Vec::with_capacity(frame_count);
    for frame in 0..frame_count {
        let mut sum = 0.0f32;
        for ch in 0..channels {
            sum += samples[frame * channels + ch];
        }
        mono.push(sum * scale);
    }
    mono
}
