//! Light source state machines and their continuous fade/flicker behavior.

use std::time::Duration;

use gloamwell_core::{Event, Item, LightId};

const NOISE_MULTIPLIER: u64 = 6_364_136_223_846_793_005;
const NOISE_INCREMENT: u64 = 1;
const NOISE_CELL_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Optional perturbation applied to a light's fade targets while lit.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Effect {
    /// Steady light that simply fades between zero and its base values.
    Steady,
    /// Flame-style flicker driven by smooth value noise.
    Flicker {
        /// Maximum deviation applied to the intensity target.
        intensity_variation: f32,
        /// Maximum deviation applied to the radius target.
        radius_variation: f32,
        /// Rate at which the noise field is traversed.
        speed: f32,
        /// Per-instance seed so flicker decorrelates across lights.
        seed: u64,
    },
}

/// Requirement consulted before a light may be turned on.
#[derive(Clone, Debug)]
pub(crate) struct Gate {
    pub(crate) item: Item,
    pub(crate) message: String,
}

/// Optional self-extinguish countdown attached to a light.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Lifetime {
    enabled: bool,
    duration: Duration,
    remaining: Option<Duration>,
}

impl Lifetime {
    pub(crate) const fn disabled() -> Self {
        Self {
            enabled: false,
            duration: Duration::ZERO,
            remaining: None,
        }
    }

    pub(crate) const fn with_duration(duration: Duration) -> Self {
        Self {
            enabled: true,
            duration,
            remaining: None,
        }
    }

    /// Arms the countdown if lifetime is enabled. Called on off-to-on edges.
    fn arm(&mut self) {
        if self.enabled {
            self.remaining = Some(self.duration);
        }
    }

    /// Cancels any active countdown. Called on on-to-off edges.
    fn cancel(&mut self) {
        self.remaining = None;
    }

    /// Enables the countdown; re-arms immediately when the light is lit.
    pub(crate) fn enable(&mut self, duration: Duration, light_is_on: bool) {
        self.enabled = true;
        self.duration = duration;
        if light_is_on {
            self.remaining = Some(duration);
        }
    }

    /// Disables the countdown without touching the light's state.
    pub(crate) fn disable(&mut self) {
        self.enabled = false;
        self.remaining = None;
    }

    /// Advances an armed countdown, reporting whether it expired this tick.
    fn advance(&mut self, dt: Duration) -> bool {
        let Some(remaining) = self.remaining else {
            return false;
        };
        let rest = remaining.saturating_sub(dt);
        if rest.is_zero() {
            self.remaining = None;
            true
        } else {
            self.remaining = Some(rest);
            false
        }
    }

    pub(crate) const fn remaining(&self) -> Option<Duration> {
        self.remaining
    }
}

/// A controllable light source: logical on/off state plus the continuous
/// intensity/radius values that chase it.
#[derive(Clone, Debug)]
pub(crate) struct Light {
    pub(crate) id: LightId,
    pub(crate) is_on: bool,
    pub(crate) intensity: f32,
    pub(crate) radius: f32,
    target_intensity: f32,
    target_radius: f32,
    intensity_base: f32,
    radius_base: f32,
    fade_speed: f32,
    effect: Effect,
    pub(crate) gate: Option<Gate>,
    pub(crate) lifetime: Lifetime,
}

impl Light {
    pub(crate) fn new(
        id: LightId,
        lit: bool,
        intensity_base: f32,
        radius_base: f32,
        fade_speed: f32,
        effect: Effect,
        gate: Option<Gate>,
        lifetime: Lifetime,
    ) -> Self {
        let mut light = Self {
            id,
            is_on: lit,
            intensity: 0.0,
            radius: 0.0,
            target_intensity: 0.0,
            target_radius: 0.0,
            intensity_base,
            radius_base,
            fade_speed,
            effect,
            gate,
            lifetime,
        };
        light.retarget();
        light
    }

    /// Applies a logical transition, reporting whether the state changed.
    ///
    /// Requirement gates are the caller's concern; this always succeeds.
    pub(crate) fn set_state(&mut self, on: bool) -> bool {
        if self.is_on == on {
            return false;
        }
        self.is_on = on;
        if on {
            self.lifetime.arm();
        } else {
            self.lifetime.cancel();
        }
        self.retarget();
        true
    }

    /// Advances an armed lifetime countdown, reporting expiry.
    pub(crate) fn advance_lifetime(&mut self, dt: Duration) -> bool {
        self.lifetime.advance(dt)
    }

    /// Integrates the fade toward the current targets, perturbing them first
    /// when a flicker effect is active. The per-tick change of the current
    /// values is bounded by `fade_speed * dt` and never overshoots.
    pub(crate) fn integrate(&mut self, elapsed_seconds: f32, dt_seconds: f32) {
        if self.is_on {
            if let Effect::Flicker {
                intensity_variation,
                radius_variation,
                speed,
                seed,
            } = self.effect
            {
                let noise = value_noise(seed, elapsed_seconds * speed);
                self.target_intensity =
                    self.intensity_base + lerp(-intensity_variation, intensity_variation, noise);
                self.target_radius =
                    self.radius_base + lerp(-radius_variation, radius_variation, noise);
            }
        }

        let max_delta = self.fade_speed * dt_seconds;
        self.intensity = move_towards(self.intensity, self.target_intensity, max_delta);
        self.radius = move_towards(self.radius, self.target_radius, max_delta);
    }

    fn retarget(&mut self) {
        if self.is_on {
            self.target_intensity = self.intensity_base;
            self.target_radius = self.radius_base;
        } else {
            self.target_intensity = 0.0;
            self.target_radius = 0.0;
        }
    }
}

/// Forces a light to the requested state, emitting the transition event.
///
/// Used by the puzzle layer and lifetime expiry, which bypass ignition gates.
pub(crate) fn drive(
    lights: &mut [Light],
    id: LightId,
    on: bool,
    out_events: &mut Vec<Event>,
) -> bool {
    let Some(light) = lights.iter_mut().find(|light| light.id == id) else {
        return false;
    };
    if light.set_state(on) {
        out_events.push(Event::LightStateChanged { light: id, is_on: on });
        true
    } else {
        false
    }
}

/// Reads the logical state of a light by identifier.
pub(crate) fn state_of(lights: &[Light], id: LightId) -> Option<bool> {
    lights
        .iter()
        .find(|light| light.id == id)
        .map(|light| light.is_on)
}

/// Moves `current` toward `target` by at most `max_delta`, never overshooting.
pub(crate) fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    let difference = target - current;
    if difference.abs() <= max_delta {
        target
    } else {
        current + max_delta.copysign(difference)
    }
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Smooth deterministic 1D value noise in `[0, 1]`, interpolated between
/// hashed lattice points with a smoothstep curve.
fn value_noise(seed: u64, t: f32) -> f32 {
    let floor = t.floor();
    let cell = floor as i64;
    let fraction = t - floor;
    let eased = fraction * fraction * (3.0 - 2.0 * fraction);
    let a = lattice_value(seed, cell);
    let b = lattice_value(seed, cell.wrapping_add(1));
    lerp(a, b, eased)
}

fn lattice_value(seed: u64, cell: i64) -> f32 {
    let mut state = seed ^ (cell as u64).wrapping_mul(NOISE_CELL_SALT);
    state = state.wrapping_mul(NOISE_MULTIPLIER).wrapping_add(NOISE_INCREMENT);
    state ^= state >> 33;
    ((state >> 40) & 0x00ff_ffff) as f32 / 0x0100_0000 as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steady_light(lit: bool) -> Light {
        Light::new(
            LightId::new(0),
            lit,
            1.0,
            5.0,
            3.0,
            Effect::Steady,
            None,
            Lifetime::disabled(),
        )
    }

    #[test]
    fn set_state_is_idempotent() {
        let mut light = steady_light(false);
        assert!(light.set_state(true));
        assert!(!light.set_state(true));
        assert!(light.set_state(false));
        assert!(!light.set_state(false));
    }

    #[test]
    fn fade_is_rate_limited_and_never_overshoots() {
        let mut light = steady_light(true);
        light.integrate(0.0, 0.1);
        assert!((light.intensity - 0.3).abs() < f32::EPSILON);
        for step in 1..100 {
            light.integrate(step as f32 * 0.1, 0.1);
        }
        assert!((light.intensity - 1.0).abs() < f32::EPSILON);
        assert!((light.radius - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn turning_off_mid_fade_reverses_direction() {
        let mut light = steady_light(true);
        light.integrate(0.0, 0.1);
        let part_way = light.intensity;
        assert!(light.set_state(false));
        light.integrate(0.1, 0.05);
        assert!(light.intensity < part_way);
        assert!(light.intensity >= 0.0);
    }

    #[test]
    fn flicker_targets_stay_within_variation_bounds() {
        let mut light = Light::new(
            LightId::new(1),
            true,
            1.0,
            5.0,
            100.0,
            Effect::Flicker {
                intensity_variation: 0.2,
                radius_variation: 0.5,
                speed: 2.0,
                seed: 0xfeed,
            },
            None,
            Lifetime::disabled(),
        );

        // High fade speed keeps current glued to the perturbed target.
        for step in 0..200 {
            light.integrate(step as f32 * 0.05, 0.05);
            assert!(light.intensity <= 1.2 + 1e-4);
            assert!(light.intensity >= 0.8 - 1e-4);
            assert!(light.radius <= 5.5 + 1e-4);
        }
    }

    #[test]
    fn flicker_is_deterministic_per_seed_and_decorrelated_across_seeds() {
        let noise_a: Vec<f32> = (0..32).map(|i| value_noise(42, i as f32 * 0.37)).collect();
        let noise_b: Vec<f32> = (0..32).map(|i| value_noise(42, i as f32 * 0.37)).collect();
        let noise_c: Vec<f32> = (0..32).map(|i| value_noise(43, i as f32 * 0.37)).collect();

        assert_eq!(noise_a, noise_b);
        assert_ne!(noise_a, noise_c);
        for sample in &noise_a {
            assert!((0.0..=1.0).contains(sample));
        }
    }

    #[test]
    fn lifetime_arms_on_ignition_and_cancels_on_extinguish() {
        let mut light = Light::new(
            LightId::new(2),
            false,
            1.0,
            5.0,
            3.0,
            Effect::Steady,
            None,
            Lifetime::with_duration(Duration::from_secs(5)),
        );

        assert!(light.lifetime.remaining().is_none());
        assert!(light.set_state(true));
        assert_eq!(light.lifetime.remaining(), Some(Duration::from_secs(5)));
        assert!(light.set_state(false));
        assert!(light.lifetime.remaining().is_none());
    }

    #[test]
    fn lifetime_expires_exactly_once() {
        let mut light = Light::new(
            LightId::new(3),
            false,
            1.0,
            5.0,
            3.0,
            Effect::Steady,
            None,
            Lifetime::with_duration(Duration::from_secs(5)),
        );
        assert!(light.set_state(true));

        let dt = Duration::from_secs(1);
        for _ in 0..4 {
            assert!(!light.advance_lifetime(dt));
        }
        assert!(light.advance_lifetime(dt));
        assert!(!light.advance_lifetime(dt));
    }

    #[test]
    fn enabling_lifetime_while_lit_arms_immediately() {
        let mut light = steady_light(true);
        light.lifetime.enable(Duration::from_secs(3), light.is_on);
        assert_eq!(light.lifetime.remaining(), Some(Duration::from_secs(3)));

        light.lifetime.disable();
        assert!(light.lifetime.remaining().is_none());
        assert!(light.is_on);
    }

    #[test]
    fn move_towards_clamps_in_both_directions() {
        assert!((move_towards(0.0, 1.0, 0.25) - 0.25).abs() < f32::EPSILON);
        assert!((move_towards(1.0, 0.0, 0.25) - 0.75).abs() < f32::EPSILON);
        assert!((move_towards(0.9, 1.0, 0.25) - 1.0).abs() < f32::EPSILON);
    }
}
