use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Denoising schedule used for sampling.
///
/// Only names the strategy; the scheduler factory turns it into an
/// implementation.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum SchedulerType {
    /// Pseudo numerical methods for diffusion models.
    #[default]
    Pndm,
    /// DPM-Solver++ multistep.
    DpmSolverMultistep,
    /// Discrete flow-matching Euler schedule.
    DiscreteFlow,
}

/// Random number generator used for the initial noise latents.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum RngType {
    /// Mersenne Twister with Box-Muller, matching NumPy's legacy generator.
    #[default]
    Numpy,
    /// Matches the CPU generator of PyTorch.
    Torch,
    /// Philox, matching the CUDA generator.
    Nvidia,
}
