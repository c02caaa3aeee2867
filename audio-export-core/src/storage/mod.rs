pub mod manifest;
pub mod wav_writer;
