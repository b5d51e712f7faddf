//! Upload an image, pick a camera angle with three sliders, and send it to an
//! image-generation backend with the angle spelled out in the prompt.

pub mod backend;
pub mod camera;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod page;
pub mod routes;
pub mod upload;

pub use backend::{Backend, CustomEndpoint, GenerationResult, ImagePayload, PayloadSchema};
pub use camera::{compose_prompt, describe, CameraDescription};
pub use config::Config;
pub use dispatch::Dispatcher;
pub use error::GenerationError;
pub use routes::{router, AppState};
