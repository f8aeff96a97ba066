pub mod conversion_service;
pub mod metadata;
pub mod transcoder;
