// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in biodiesel production process.

use crate::step::{Effect, Step, StepTarget};

/// Readout shown before the animation starts and after a reset
pub const READY_READOUT: &str = "Ready to start";

/// Readout shown once the last step has run
pub const COMPLETE_READOUT: &str = "Animation complete!";

/// The eight steps of castor-oil biodiesel production
pub fn biodiesel_process() -> Vec<Step> {
    vec![
        Step::new(
            "Preparing raw materials",
            "Measuring and preparing castor oil, methanol and catalyst in correct ratios.",
            1500,
        )
        .target(StepTarget::plain("item-castor"))
        .target(StepTarget::plain("item-methanol"))
        .target(StepTarget::plain("item-naoh")),
        Step::new(
            "Ultrasonication mixing",
            "Intense mixing using ultrasonic cavitation to improve contact between reagents.",
            2000,
        )
        .target(StepTarget::with_effect("item-ultrasonic", Effect::Mixing))
        .connector("arrow-1")
        .connector("arrow-2")
        .connector("arrow-3"),
        Step::new(
            "Heating the mixture",
            "Controlled heating to activate and speed up the transesterification reaction.",
            2500,
        )
        .target(StepTarget::with_effect("item-heating", Effect::HeatingActive))
        .connector("arrow-4"),
        Step::new(
            "First separation",
            "Allow the reaction to settle so glycerol separates from crude biodiesel.",
            2000,
        )
        .target(StepTarget::with_effect("item-separation1", Effect::Draining))
        .connector("arrow-5"),
        Step::new(
            "Collecting glycerol",
            "Drain and collect glycerol byproduct for reuse or sale.",
            1500,
        )
        .target(StepTarget::plain("item-glycerol")),
        Step::new(
            "Water washing",
            "Wash biodiesel with water to remove residual catalyst, methanol and soaps.",
            2000,
        )
        .target(StepTarget::with_effect("item-washing", Effect::WashingActive))
        .connector("arrow-6"),
        Step::new(
            "Final separation",
            "Separate water and remaining impurities; prepare for drying.",
            2000,
        )
        .target(StepTarget::with_effect("item-separation2", Effect::Draining))
        .connector("arrow-7"),
        Step::new(
            "Pure biodiesel (B100)",
            "Final product ready — pure biodiesel suitable for use or blending.",
            2000,
        )
        .target(StepTarget::with_effect("item-biodiesel", Effect::Fill))
        .connector("arrow-8"),
    ]
}

/// Total time from start to the completion readout, in milliseconds
pub fn total_duration_ms(steps: &[Step]) -> u64 {
    steps.iter().map(|s| s.duration_ms).sum()
}
