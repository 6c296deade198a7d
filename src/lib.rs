// * notesift: social-note collection and text/image analytics pipeline
// * collect -> normalize -> tokenize -> (tfidf | topics | network), and
// * download-images -> collage. Every stage reads and writes plain files.

pub mod analytics;
pub mod collector;
pub mod config;
pub mod engine;
pub mod media;
pub mod network;
pub mod ops;
pub mod persistence;
pub mod refinery;
