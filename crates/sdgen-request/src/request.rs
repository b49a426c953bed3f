use std::hash::{Hash, Hasher};

use strum::Display;

use crate::raster::SdImage;
use crate::strategy::{RngType, SchedulerType};

// ── Defaults ─────────────────────────────────────────────────────────────────

/// Full noise: a starting image has no influence.
pub const DEFAULT_STRENGTH: f32 = 1.0;
pub const DEFAULT_IMAGE_COUNT: u32 = 1;
pub const DEFAULT_STEP_COUNT: u32 = 50;
pub const DEFAULT_SEED: u32 = 0;
pub const DEFAULT_GUIDANCE_SCALE: f32 = 7.5;
/// Latent scale factor of the Stable Diffusion 1.x/2.x VAE.
pub const DEFAULT_LATENT_SCALE_FACTOR: f32 = 0.18215;

// ── Mode ─────────────────────────────────────────────────────────────────────

/// Kind of processing a request asks the pipeline to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Mode {
    TextToImage,
    ImageToImage,
}

/// Derive the [`Mode`] from a starting image and strength.
///
/// A starting image only conditions generation when `strength < 1.0`; at
/// full strength the noise erases it and the run is plain text-to-image.
/// That includes `strength == 1.0` exactly and a NaN strength.
pub fn mode_for(starting_image: Option<&SdImage>, strength: f32) -> Mode {
    match starting_image {
        Some(_) if strength < 1.0 => Mode::ImageToImage,
        _ => Mode::TextToImage,
    }
}

// ── GenerationRequest ────────────────────────────────────────────────────────

/// Every user-controllable parameter of one generation run.
///
/// Construct with [`GenerationRequest::new`] and adjust the rest with the
/// chainable setters or by assigning the public fields. Nothing is validated
/// here; the pipeline checks the values when it resolves a
/// [`crate::GenerationPlan`].
///
/// Two requests are equal when every field is equal. Images compare by pixel
/// content and floats by bit pattern, so `Eq` and `Hash` agree.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Text prompt to guide sampling. May be empty.
    pub prompt: String,

    /// Text prompt to steer sampling away from.
    pub negative_prompt: String,

    /// Starting image for image-to-image generation.
    pub starting_image: Option<SdImage>,

    /// Fraction of the noise schedule applied to the starting image.
    pub strength: f32,

    /// Number of images to generate.
    pub image_count: u32,

    /// Number of denoising steps.
    pub step_count: u32,

    /// Seed for the RNG selected by `rng_type`.
    pub seed: u32,

    /// Influence of the text prompt on sampling. `0` gives unconditioned
    /// samples.
    pub guidance_scale: f32,

    /// One image per ControlNet model, in the pipeline's model order.
    pub control_net_inputs: Vec<SdImage>,

    /// Ask the pipeline to skip its safety checker.
    pub disable_safety: bool,

    /// Decode denoised latents for progress previews instead of reporting the
    /// raw latents.
    pub use_denoised_intermediates: bool,

    pub scheduler_type: SchedulerType,

    pub rng_type: RngType,

    /// Scale applied to the latent after VAE encoding.
    pub encoder_scale_factor: f32,

    /// Scale applied to the latent before VAE decoding.
    pub decoder_scale_factor: f32,
}

impl GenerationRequest {
    /// A request for `prompt` with every other field at its default.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            negative_prompt: String::new(),
            starting_image: None,
            strength: DEFAULT_STRENGTH,
            image_count: DEFAULT_IMAGE_COUNT,
            step_count: DEFAULT_STEP_COUNT,
            seed: DEFAULT_SEED,
            guidance_scale: DEFAULT_GUIDANCE_SCALE,
            control_net_inputs: Vec::new(),
            disable_safety: false,
            use_denoised_intermediates: false,
            scheduler_type: SchedulerType::default(),
            rng_type: RngType::default(),
            encoder_scale_factor: DEFAULT_LATENT_SCALE_FACTOR,
            decoder_scale_factor: DEFAULT_LATENT_SCALE_FACTOR,
        }
    }

    /// The mode this request runs in, recomputed on every call.
    pub fn mode(&self) -> Mode {
        mode_for(self.starting_image.as_ref(), self.strength)
    }

    pub fn negative_prompt(mut self, v: impl Into<String>) -> Self {
        self.negative_prompt = v.into();
        self
    }

    pub fn starting_image(mut self, v: SdImage) -> Self {
        self.starting_image = Some(v);
        self
    }

    pub fn strength(mut self, v: f32) -> Self {
        self.strength = v;
        self
    }

    pub fn image_count(mut self, v: u32) -> Self {
        self.image_count = v;
        self
    }

    pub fn step_count(mut self, v: u32) -> Self {
        self.step_count = v;
        self
    }

    pub fn seed(mut self, v: u32) -> Self {
        self.seed = v;
        self
    }

    pub fn guidance_scale(mut self, v: f32) -> Self {
        self.guidance_scale = v;
        self
    }

    pub fn control_net_inputs(mut self, v: impl IntoIterator<Item = SdImage>) -> Self {
        self.control_net_inputs = v.into_iter().collect();
        self
    }

    /// Append one ControlNet input after the existing ones.
    pub fn push_control_net_input(mut self, v: SdImage) -> Self {
        self.control_net_inputs.push(v);
        self
    }

    pub fn disable_safety(mut self, v: bool) -> Self {
        self.disable_safety = v;
        self
    }

    pub fn use_denoised_intermediates(mut self, v: bool) -> Self {
        self.use_denoised_intermediates = v;
        self
    }

    pub fn scheduler_type(mut self, v: SchedulerType) -> Self {
        self.scheduler_type = v;
        self
    }

    pub fn rng_type(mut self, v: RngType) -> Self {
        self.rng_type = v;
        self
    }

    pub fn encoder_scale_factor(mut self, v: f32) -> Self {
        self.encoder_scale_factor = v;
        self
    }

    pub fn decoder_scale_factor(mut self, v: f32) -> Self {
        self.decoder_scale_factor = v;
        self
    }
}

impl PartialEq for GenerationRequest {
    fn eq(&self, other: &Self) -> bool {
        self.prompt == other.prompt
            && self.negative_prompt == other.negative_prompt
            && self.starting_image == other.starting_image
            && self.strength.to_bits() == other.strength.to_bits()
            && self.image_count == other.image_count
            && self.step_count == other.step_count
            && self.seed == other.seed
            && self.guidance_scale.to_bits() == other.guidance_scale.to_bits()
            && self.control_net_inputs == other.control_net_inputs
            && self.disable_safety == other.disable_safety
            && self.use_denoised_intermediates == other.use_denoised_intermediates
            && self.scheduler_type == other.scheduler_type
            && self.rng_type == other.rng_type
            && self.encoder_scale_factor.to_bits() == other.encoder_scale_factor.to_bits()
            && self.decoder_scale_factor.to_bits() == other.decoder_scale_factor.to_bits()
    }
}

impl Eq for GenerationRequest {}

impl Hash for GenerationRequest {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Destructured so a new field cannot be left out.
        let Self {
            prompt,
            negative_prompt,
            starting_image,
            strength,
            image_count,
            step_count,
            seed,
            guidance_scale,
            control_net_inputs,
            disable_safety,
            use_denoised_intermediates,
            scheduler_type,
            rng_type,
            encoder_scale_factor,
            decoder_scale_factor,
        } = self;

        prompt.hash(state);
        negative_prompt.hash(state);
        starting_image.hash(state);
        strength.to_bits().hash(state);
        image_count.hash(state);
        step_count.hash(state);
        seed.hash(state);
        guidance_scale.to_bits().hash(state);
        control_net_inputs.hash(state);
        disable_safety.hash(state);
        use_denoised_intermediates.hash(state);
        scheduler_type.hash(state);
        rng_type.hash(state);
        encoder_scale_factor.to_bits().hash(state);
        decoder_scale_factor.to_bits().hash(state);
    }
}
