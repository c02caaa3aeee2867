pub mod audio_decoder;
pub mod export_delegate;
pub mod record_source;
