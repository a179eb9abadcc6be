//! Text recognition for leaderboard fields.
//!
//! Tesseract runs as an external process behind the `TextRecognizer` trait.
//! `ZoneExtractor` crops and binarizes one calibrated zone of a frame and
//! returns the recognized token.

pub mod engine;
pub mod extract;
pub mod preprocess;
pub mod setup;

pub use engine::{Charset, TesseractEngine, TextRecognizer};
pub use extract::{digits_only, ZoneExtractor};
pub use setup::ensure_tesseract;
