pub mod elasticsearch_service;
pub mod fields;
pub mod image_service;
pub mod ingestion_service;
pub mod selector;
pub mod session_service;
pub mod stats;
pub mod tool_service;
pub mod transcript_service;
pub mod youtube_service;
