pub mod client;
pub mod wire;
pub mod worker;

pub use client::{HttpRecognizer, Recognizer, DEFAULT_ENDPOINT};
pub use wire::{CalculateRequest, CalculateResponse, RecognitionResult};
pub use worker::{Completion, RecognitionWorker};
