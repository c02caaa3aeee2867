pub mod decoders;
pub mod label;
pub mod wav_format;
