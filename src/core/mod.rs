pub mod cache;
pub mod conversion;
pub mod converter;
pub mod output;
pub mod staging;

// Re-export commonly used types for convenience
pub use cache::CacheState;
pub use conversion::{
    ConversionResult, ConversionService, ConversionSettings, ConvertedAudio, StagedUpload, Upload,
    validate_content_type,
};
pub use converter::{
    AudioInput, ConverterError, ConverterResult, ElevenLabsClient, ElevenLabsConfig,
    SharedConverter, Voice, VoiceConverter, create_voice_converter,
};
pub use output::{OutputStore, PublishedAudio, generate_output_filename};
pub use staging::{StagingError, StagingFile};
