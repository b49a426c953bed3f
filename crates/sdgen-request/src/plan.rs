use tracing::{debug, trace};

use crate::error::ConfigurationError;
use crate::request::{GenerationRequest, Mode};

/// What a loaded pipeline is able to do, as far as request resolution cares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineCapabilities {
    /// A safety checker model is loaded.
    pub can_safety_check: bool,
    /// Number of ControlNet models loaded, in input order.
    pub control_net_count: usize,
}

/// What progress callbacks receive while denoising.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPreview {
    /// Raw latents of the current step.
    Latents,
    /// Denoised latents run through the decoder.
    Decoded,
}

/// The pipeline's reading of a [`GenerationRequest`]: checked values and the
/// decisions the request leaves to the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationPlan {
    pub mode: Mode,
    /// `can_safety_check && !disable_safety`.
    pub run_safety_check: bool,
    /// Index of the first scheduler step that runs. Non-zero only for
    /// image-to-image, where the noised starting image stands in for the
    /// earlier steps.
    pub start_step: u32,
    /// Number of denoising steps that run, always at least 1.
    pub denoise_steps: u32,
    pub preview: ProgressPreview,
    /// `false` when `guidance_scale == 0`, which samples without the prompt.
    pub classifier_free_guidance: bool,
}

impl GenerationPlan {
    /// Check `request` against `caps` and work out the run's step range and
    /// flags.
    ///
    /// # Errors
    /// Returns a [`ConfigurationError`] for zero image or step counts,
    /// non-finite numeric fields, an image-to-image strength outside
    /// `[0.0, 1.0]`, or a ControlNet input count that differs from the loaded
    /// models.
    pub fn resolve(
        request: &GenerationRequest,
        caps: &PipelineCapabilities,
    ) -> Result<Self, ConfigurationError> {
        if request.image_count == 0 {
            return Err(ConfigurationError::ZeroImageCount);
        }
        if request.step_count == 0 {
            return Err(ConfigurationError::ZeroStepCount);
        }

        check_finite("guidance_scale", request.guidance_scale)?;
        check_finite("encoder_scale_factor", request.encoder_scale_factor)?;
        check_finite("decoder_scale_factor", request.decoder_scale_factor)?;

        let actual = request.control_net_inputs.len();
        if actual != caps.control_net_count {
            return Err(ConfigurationError::ControlNetInputMismatch {
                expected: caps.control_net_count,
                actual,
            });
        }

        // Strength only matters once a starting image is attached; a text
        // request keeps whatever value it carries.
        if request.starting_image.is_some() {
            check_finite("strength", request.strength)?;
            if !(0.0..=1.0).contains(&request.strength) {
                return Err(ConfigurationError::StrengthOutOfRange {
                    strength: request.strength,
                });
            }
        }

        let mode = request.mode();
        let denoise_steps = match mode {
            Mode::TextToImage => request.step_count,
            Mode::ImageToImage => {
                ((request.step_count as f32 * request.strength) as u32).clamp(1, request.step_count)
            }
        };
        let start_step = request.step_count - denoise_steps;

        let run_safety_check = caps.can_safety_check && !request.disable_safety;
        if caps.can_safety_check && request.disable_safety {
            trace!("safety checker available but disabled by request");
        }

        let plan = Self {
            mode,
            run_safety_check,
            start_step,
            denoise_steps,
            preview: if request.use_denoised_intermediates {
                ProgressPreview::Decoded
            } else {
                ProgressPreview::Latents
            },
            classifier_free_guidance: request.guidance_scale != 0.0,
        };

        debug!(
            "resolved {} plan: steps {}..{}, {} image(s), scheduler {}, rng {}, seed {}",
            plan.mode,
            plan.start_step,
            request.step_count,
            request.image_count,
            request.scheduler_type,
            request.rng_type,
            request.seed,
        );

        Ok(plan)
    }
}

fn check_finite(field: &'static str, value: f32) -> Result<(), ConfigurationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigurationError::NonFiniteValue { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::SdImage;
    use tracing_test::traced_test;

    fn image() -> SdImage {
        SdImage::new(8, 8, 3, vec![0u8; 8 * 8 * 3])
    }

    fn caps() -> PipelineCapabilities {
        PipelineCapabilities {
            can_safety_check: true,
            control_net_count: 0,
        }
    }

    #[test]
    fn default_request_runs_every_step() {
        let plan = GenerationPlan::resolve(&GenerationRequest::new("x"), &caps()).unwrap();
        assert_eq!(plan.mode, Mode::TextToImage);
        assert_eq!(plan.start_step, 0);
        assert_eq!(plan.denoise_steps, 50);
        assert!(plan.run_safety_check);
        assert_eq!(plan.preview, ProgressPreview::Latents);
        assert!(plan.classifier_free_guidance);
    }

    #[test]
    fn image_to_image_skips_early_steps() {
        let req = GenerationRequest::new("a cat")
            .starting_image(image())
            .strength(0.6);
        let plan = GenerationPlan::resolve(&req, &caps()).unwrap();
        assert_eq!(plan.mode, Mode::ImageToImage);
        assert_eq!(plan.denoise_steps, 30);
        assert_eq!(plan.start_step, 20);
    }

    #[test]
    fn zero_strength_still_runs_one_step() {
        let req = GenerationRequest::new("a cat")
            .starting_image(image())
            .strength(0.0)
            .step_count(10);
        let plan = GenerationPlan::resolve(&req, &caps()).unwrap();
        assert_eq!(plan.denoise_steps, 1);
        assert_eq!(plan.start_step, 9);
    }

    #[test]
    fn full_strength_image_runs_as_text_to_image() {
        let req = GenerationRequest::new("a cat")
            .starting_image(image())
            .strength(1.0);
        let plan = GenerationPlan::resolve(&req, &caps()).unwrap();
        assert_eq!(plan.mode, Mode::TextToImage);
        assert_eq!(plan.denoise_steps, 50);
    }

    #[test]
    fn safety_check_needs_capability_and_consent() {
        let cases = [
            (true, false, true),
            (true, true, false),
            (false, false, false),
            (false, true, false),
        ];
        for (can_check, disable, expected) in cases {
            let caps = PipelineCapabilities {
                can_safety_check: can_check,
                control_net_count: 0,
            };
            let req = GenerationRequest::new("x").disable_safety(disable);
            let plan = GenerationPlan::resolve(&req, &caps).unwrap();
            assert_eq!(
                plan.run_safety_check, expected,
                "can_safety_check={can_check} disable_safety={disable}"
            );
        }
    }

    #[test]
    fn denoised_intermediates_select_decoded_previews() {
        let req = GenerationRequest::new("x").use_denoised_intermediates(true);
        let plan = GenerationPlan::resolve(&req, &caps()).unwrap();
        assert_eq!(plan.preview, ProgressPreview::Decoded);
    }

    #[test]
    fn zero_guidance_disables_classifier_free_guidance() {
        let req = GenerationRequest::new("").guidance_scale(0.0);
        let plan = GenerationPlan::resolve(&req, &caps()).unwrap();
        assert!(!plan.classifier_free_guidance);
    }

    #[test]
    fn rejects_zero_counts() {
        let err = GenerationPlan::resolve(&GenerationRequest::new("x").image_count(0), &caps())
            .unwrap_err();
        assert_eq!(err, ConfigurationError::ZeroImageCount);

        let err = GenerationPlan::resolve(&GenerationRequest::new("x").step_count(0), &caps())
            .unwrap_err();
        assert_eq!(err, ConfigurationError::ZeroStepCount);
    }

    #[test]
    fn strength_is_only_checked_with_a_starting_image() {
        let text = GenerationRequest::new("x").strength(-3.0);
        assert!(GenerationPlan::resolve(&text, &caps()).is_ok());

        let img = text.starting_image(image());
        let err = GenerationPlan::resolve(&img, &caps()).unwrap_err();
        assert!(
            matches!(err, ConfigurationError::StrengthOutOfRange { strength } if strength == -3.0),
            "unexpected error: {err}"
        );

        let nan = GenerationRequest::new("x")
            .starting_image(image())
            .strength(f32::NAN);
        let err = GenerationPlan::resolve(&nan, &caps()).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::NonFiniteValue { field: "strength", .. }
        ));
    }

    #[test]
    fn control_net_inputs_must_match_loaded_models() {
        let caps = PipelineCapabilities {
            can_safety_check: false,
            control_net_count: 2,
        };
        let req = GenerationRequest::new("x").push_control_net_input(image());
        let err = GenerationPlan::resolve(&req, &caps).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::ControlNetInputMismatch {
                expected: 2,
                actual: 1
            }
        );

        let req = req.push_control_net_input(image());
        assert!(GenerationPlan::resolve(&req, &caps).is_ok());
    }

    #[test]
    fn rejects_non_finite_scale_factors() {
        let req = GenerationRequest::new("x").decoder_scale_factor(f32::INFINITY);
        let err = GenerationPlan::resolve(&req, &caps()).unwrap_err();
        assert_eq!(err.to_string(), "decoder_scale_factor must be finite (got inf)");
    }

    #[test]
    fn resolving_leaves_the_request_untouched() {
        let req = GenerationRequest::new("a cat")
            .starting_image(image())
            .strength(0.4);
        let before = req.clone();
        GenerationPlan::resolve(&req, &caps()).unwrap();
        assert_eq!(req, before);
    }

    #[test]
    #[traced_test]
    fn resolve_logs_the_plan() {
        let req = GenerationRequest::new("a cat")
            .starting_image(image())
            .strength(0.5)
            .step_count(20);
        GenerationPlan::resolve(&req, &caps()).unwrap();
        assert!(logs_contain("resolved image-to-image plan: steps 10..20"));
    }
}
