//! Request configuration for a single image generation run.
//!
//! A [`GenerationRequest`] carries every user-controllable parameter of one
//! run and derives the operating [`Mode`] from its starting image and
//! strength. The denoising loop, scheduler, RNG and VAE are external; they
//! read the request and never write back into it.
//!
//! # Example
//! ```
//! use sdgen_request::{GenerationRequest, Mode, SdImage};
//!
//! let init = SdImage::new(64, 64, 3, vec![0u8; 64 * 64 * 3]);
//! let request = GenerationRequest::new("a cat")
//!     .starting_image(init)
//!     .strength(0.6);
//! assert_eq!(request.mode(), Mode::ImageToImage);
//!
//! let request = request.strength(1.0);
//! assert_eq!(request.mode(), Mode::TextToImage);
//! ```

mod error;
mod plan;
mod raster;
mod request;
mod strategy;

pub use error::ConfigurationError;
pub use raster::SdImage;
pub use plan::{GenerationPlan, PipelineCapabilities, ProgressPreview};
pub use request::*;
pub use strategy::{RngType, SchedulerType};
