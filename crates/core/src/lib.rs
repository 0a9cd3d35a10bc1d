pub mod shared {
    pub mod config;
    pub mod constants;
    pub mod error;
}

pub mod audio {
    pub mod domain {
        pub mod feature_extractor;
        pub mod mel_filterbank;
        pub mod waveform;
    }
}

pub mod text {
    pub mod domain {
        pub mod languages;
        pub mod special_tokens;
        pub mod tokenizer;
        pub mod vocabulary;
    }
}

pub mod inference {
    pub mod domain {
        pub mod inference_bridge;
    }
    pub mod infrastructure;
}

pub mod decoding {
    pub mod domain {
        pub mod decoding_engine;
        pub mod token_selector;
    }
}

pub mod pipeline {
    pub mod pipeline_logger;
    pub mod transcript;
    pub mod transcription_service;
}
