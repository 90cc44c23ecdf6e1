//! Core model for the camera panel's custom slider control.
//!
//! Everything in here is pure: scale mappings between drag position and
//! reported value, drag/inertia physics, tick generation and display
//! formatting. The DOM half of the widget lives in the application binary
//! and delegates all numeric decisions to this crate, so the behaviour is
//! testable without a browser.

/// Default slider parameters, used when a host attribute is missing or
/// malformed.
pub mod defaults {
    pub const VIEWPORT_WIDTH: f64 = 250.0;
    pub const MULTIPLIER: f64 = 3.0;
    pub const MIN_VALUE: f64 = 0.000125;
    pub const MAX_VALUE: f64 = 32.0;
    pub const TICK_DENSITY: u32 = 10;
}

/// Drag physics constants.
pub mod physics {
    /// Geometric velocity decay applied once per animation frame.
    pub const DECAY: f64 = 0.95;
    /// Inertia stops once |velocity| falls below this many px per frame.
    pub const STOP_THRESHOLD: f64 = 0.1;
    /// Converts raw pointer speed (px/ms) into a px-per-frame velocity.
    pub const VELOCITY_SCALE: f64 = 15.0;
}

/// How drag percentage maps to a value between `min` and `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleMode {
    Linear,
    /// Interpolates exponents base 2 between `log2(min)` and `log2(max)`.
    #[default]
    Exponential,
    /// Interpolates exponents base 10 between `log10(min)` and `log10(max)`.
    Logarithmic,
}

impl ScaleMode {
    /// Parse a `scale` attribute value. Unknown strings yield `None` so the
    /// caller can fall back to its default.
    pub fn from_attr(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "linear" => Some(ScaleMode::Linear),
            "exponential" => Some(ScaleMode::Exponential),
            "logarithmic" => Some(ScaleMode::Logarithmic),
            _ => None,
        }
    }

    fn log(self, v: f64) -> f64 {
        match self {
            ScaleMode::Linear => v,
            ScaleMode::Exponential => v.log2(),
            ScaleMode::Logarithmic => v.log10(),
        }
    }

    fn exp(self, e: f64) -> f64 {
        match self {
            ScaleMode::Linear => e,
            ScaleMode::Exponential => 2f64.powf(e),
            ScaleMode::Logarithmic => 10f64.powf(e),
        }
    }
}

/// Immutable slider configuration, fixed at construction time.
#[derive(Debug, Clone, PartialEq)]
pub struct SliderSpec {
    /// Visible window width in px.
    pub viewport_width: f64,
    /// Body width = viewport width × multiplier.
    pub multiplier: f64,
    pub min_value: f64,
    pub max_value: f64,
    pub scale: ScaleMode,
    /// Number of tick intervals along the body.
    pub tick_density: u32,
}

impl Default for SliderSpec {
    fn default() -> Self {
        Self {
            viewport_width: defaults::VIEWPORT_WIDTH,
            multiplier: defaults::MULTIPLIER,
            min_value: defaults::MIN_VALUE,
            max_value: defaults::MAX_VALUE,
            scale: ScaleMode::default(),
            tick_density: defaults::TICK_DENSITY,
        }
    }
}

impl SliderSpec {
    /// Build a spec from host-element attributes via a lookup closure.
    ///
    /// Expected attribute names: `viewport-width`, `multiplier`,
    /// `min-value`, `max-value`, `scale`, `tick-density`. A missing or
    /// unparsable attribute silently falls back to the default — the
    /// control must come up usable even on a hand-edited page.
    pub fn from_attrs<F>(attr: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        fn num<T: std::str::FromStr>(raw: Option<String>, fallback: T) -> T {
            raw.and_then(|s| s.trim().parse().ok()).unwrap_or(fallback)
        }

        Self {
            viewport_width: num(attr("viewport-width"), defaults::VIEWPORT_WIDTH),
            multiplier: num(attr("multiplier"), defaults::MULTIPLIER),
            min_value: num(attr("min-value"), defaults::MIN_VALUE),
            max_value: num(attr("max-value"), defaults::MAX_VALUE),
            scale: attr("scale")
                .and_then(|s| ScaleMode::from_attr(&s))
                .unwrap_or_default(),
            tick_density: num(attr("tick-density"), defaults::TICK_DENSITY),
        }
    }

    pub fn body_width(&self) -> f64 {
        self.viewport_width * self.multiplier
    }

    /// Magnitude of the drag range: how far (px) the body can shift left.
    pub fn travel(&self) -> f64 {
        (self.body_width() - self.viewport_width).max(0.0)
    }

    /// Bound an offset to `[-travel, 0]`.
    pub fn clamp_offset(&self, offset: f64) -> f64 {
        offset.clamp(-self.travel(), 0.0)
    }

    /// Fraction of the drag range covered by `offset`, in `[0, 1]`.
    pub fn percentage_at(&self, offset: f64) -> f64 {
        let travel = self.travel();
        if travel <= 0.0 {
            return 0.0;
        }
        (self.clamp_offset(offset) / -travel).clamp(0.0, 1.0)
    }

    /// Offset whose position corresponds to `percentage` in `[0, 1]`.
    pub fn offset_at(&self, percentage: f64) -> f64 {
        -percentage.clamp(0.0, 1.0) * self.travel()
    }

    /// Forward scale mapping: percentage in `[0, 1]` → value.
    pub fn value_at_percentage(&self, percentage: f64) -> f64 {
        let p = percentage.clamp(0.0, 1.0);
        let lo = self.scale.log(self.min_value);
        let hi = self.scale.log(self.max_value);
        self.scale.exp(lo + p * (hi - lo))
    }

    /// Inverse scale mapping: value → percentage in `[0, 1]`.
    ///
    /// Out-of-range values are silently clamped, never rejected.
    pub fn percentage_of_value(&self, value: f64) -> f64 {
        let v = value.clamp(self.min_value, self.max_value);
        let lo = self.scale.log(self.min_value);
        let hi = self.scale.log(self.max_value);
        if hi <= lo {
            return 0.0;
        }
        ((self.scale.log(v) - lo) / (hi - lo)).clamp(0.0, 1.0)
    }

    pub fn value_at_offset(&self, offset: f64) -> f64 {
        self.value_at_percentage(self.percentage_at(offset))
    }

    pub fn offset_of_value(&self, value: f64) -> f64 {
        self.offset_at(self.percentage_of_value(value))
    }

    /// Values for the `tick_density + 1` tick bars along the body, evenly
    /// spaced in the scale's own domain (so exponential sliders get evenly
    /// spaced exponents, not evenly spaced values).
    pub fn tick_values(&self) -> Vec<f64> {
        let lo = self.scale.log(self.min_value);
        let hi = self.scale.log(self.max_value);
        let n = self.tick_density.max(1);
        (0..=n)
            .map(|i| self.scale.exp(lo + (hi - lo) * f64::from(i) / f64::from(n)))
            .collect()
    }
}

/// Payload of a slider change notification: emitted on every position
/// mutation (drag move, inertia tick, programmatic set).
#[derive(Debug, Clone, PartialEq)]
pub struct SliderChange {
    /// Position as 0–100.
    pub percentage: f64,
    pub value: f64,
    pub formatted: String,
}

impl SliderChange {
    pub fn at_offset(spec: &SliderSpec, offset: f64) -> Self {
        let value = spec.value_at_offset(offset);
        Self {
            percentage: spec.percentage_at(offset) * 100.0,
            value,
            formatted: format_value(value),
        }
    }
}

/// Fixed-precision display rules keyed by magnitude band.
pub fn format_value(value: f64) -> String {
    if value < 0.001 {
        format!("{value:.1e}")
    } else if value < 0.01 {
        format!("{value:.3}")
    } else if value < 1.0 {
        format!("{value:.2}")
    } else if value < 10.0 {
        format!("{value:.1}")
    } else {
        format!("{value:.0}")
    }
}

/// Pointer speed → release velocity (px/frame). Returns `None` when the
/// timestamps are too close to divide.
pub fn drag_velocity(dx: f64, dt_ms: f64) -> Option<f64> {
    if dt_ms > 0.0 {
        Some(dx / dt_ms * physics::VELOCITY_SCALE)
    } else {
        None
    }
}

/// Whether inertia should run (or keep running) at this velocity.
pub fn inertia_active(velocity: f64) -> bool {
    velocity.abs() >= physics::STOP_THRESHOLD
}

/// One inertia frame: advance the offset by the velocity, clamp to the
/// drag bounds (zeroing velocity on impact), then decay.
///
/// |velocity| strictly decreases every frame, so repeated stepping always
/// reaches [`inertia_active`]`== false` in finitely many frames.
pub fn inertia_step(spec: &SliderSpec, offset: f64, velocity: f64) -> (f64, f64) {
    let mut next = offset + velocity;
    let mut v = velocity;
    if next > 0.0 {
        next = 0.0;
        v = 0.0;
    }
    let max_left = -spec.travel();
    if next < max_left {
        next = max_left;
        v = 0.0;
    }
    (next, v * physics::DECAY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn exposure_spec() -> SliderSpec {
        SliderSpec::default() // exponential, 0.000125..32
    }

    fn gain_spec() -> SliderSpec {
        SliderSpec {
            min_value: 0.0,
            max_value: 8.0,
            scale: ScaleMode::Linear,
            ..SliderSpec::default()
        }
    }

    #[test]
    fn set_then_get_round_trips_on_every_scale() {
        let specs = [
            gain_spec(),
            exposure_spec(),
            SliderSpec {
                scale: ScaleMode::Logarithmic,
                min_value: 0.01,
                max_value: 1000.0,
                ..SliderSpec::default()
            },
        ];
        for spec in &specs {
            for i in 0..=20 {
                let v = spec.value_at_percentage(f64::from(i) / 20.0);
                let back = spec.value_at_offset(spec.offset_of_value(v));
                assert!(
                    (back - v).abs() <= v.abs() * 1e-9 + 1e-12,
                    "{v} -> {back} on {:?}",
                    spec.scale
                );
            }
        }
    }

    #[test]
    fn out_of_range_set_is_clamped_not_rejected() {
        let spec = gain_spec();
        assert_eq!(spec.percentage_of_value(-3.0), 0.0);
        assert_eq!(spec.percentage_of_value(99.0), 1.0);
        assert_eq!(spec.offset_of_value(99.0), -spec.travel());
    }

    #[test]
    fn exponential_percentage_of_unity() {
        // min 1/8000 s, max 32 s: value 1.0 sits at the log2-space
        // proportion (0 - log2 min) / (log2 max - log2 min) ~= 72.2 %.
        let spec = exposure_spec();
        let pct = spec.percentage_of_value(1.0) * 100.0;
        assert!((pct - 72.17).abs() < 0.05, "got {pct}");
    }

    #[test]
    fn offset_stays_bounded_under_arbitrary_drags() {
        let spec = exposure_spec();
        let travel = spec.travel();
        let mut offset = 0.0;
        for delta in [-1000.0, 3.0, -0.5, 700.0, -1e6, 1e6, -42.0] {
            offset = spec.clamp_offset(offset + delta);
            assert!((-travel..=0.0).contains(&offset), "offset {offset}");
        }
    }

    #[test]
    fn inertia_terminates_and_velocity_shrinks() {
        let spec = exposure_spec();
        let mut offset = spec.offset_at(0.5);
        let mut velocity = 12.0;
        let mut frames = 0;
        while inertia_active(velocity) {
            let prev = velocity.abs();
            let (o, v) = inertia_step(&spec, offset, velocity);
            assert!(v.abs() < prev, "velocity must strictly decrease");
            assert!((-spec.travel()..=0.0).contains(&o));
            offset = o;
            velocity = v;
            frames += 1;
            assert!(frames < 10_000, "inertia failed to terminate");
        }
        // 12 * 0.95^n drops below 0.1 within ~94 frames
        assert!(frames <= 100, "took {frames} frames");
    }

    #[test]
    fn inertia_zeroes_velocity_on_hitting_a_bound() {
        let spec = gain_spec();
        let (offset, velocity) = inertia_step(&spec, -2.0, 50.0);
        assert_eq!(offset, 0.0);
        assert_eq!(velocity, 0.0);
    }

    #[test]
    fn formatting_bands() {
        assert_eq!(format_value(0.0005), "5.0e-4");
        assert_eq!(format_value(0.005), "0.005");
        assert_eq!(format_value(0.05), "0.05");
        assert_eq!(format_value(0.5), "0.50");
        assert_eq!(format_value(5.0), "5.0");
        assert_eq!(format_value(50.0), "50");
    }

    #[test]
    fn tick_values_cover_the_range_in_log_space() {
        let spec = exposure_spec();
        let ticks = spec.tick_values();
        assert_eq!(ticks.len(), 11);
        assert!((ticks[0] - spec.min_value).abs() < 1e-12);
        assert!((ticks[10] - spec.max_value).abs() < 1e-9);
        // evenly spaced exponents: constant ratio between neighbours
        let ratio = ticks[1] / ticks[0];
        for pair in ticks.windows(2) {
            assert!((pair[1] / pair[0] - ratio).abs() < 1e-9);
        }
    }

    #[test]
    fn attrs_parse_with_silent_fallbacks() {
        let mut attrs = HashMap::new();
        attrs.insert("viewport-width", "300");
        attrs.insert("min-value", "1.0");
        attrs.insert("max-value", "not-a-number");
        attrs.insert("scale", "linear");
        attrs.insert("tick-density", "8");
        let spec =
            SliderSpec::from_attrs(|name| attrs.get(name).map(|s| (*s).to_string()));
        assert_eq!(spec.viewport_width, 300.0);
        assert_eq!(spec.min_value, 1.0);
        assert_eq!(spec.max_value, defaults::MAX_VALUE); // malformed
        assert_eq!(spec.scale, ScaleMode::Linear);
        assert_eq!(spec.tick_density, 8);
        assert_eq!(spec.multiplier, defaults::MULTIPLIER); // missing

        let bare = SliderSpec::from_attrs(|_| None);
        assert_eq!(bare, SliderSpec::default());
    }

    #[test]
    fn scale_attr_parsing() {
        assert_eq!(ScaleMode::from_attr(" Linear "), Some(ScaleMode::Linear));
        assert_eq!(
            ScaleMode::from_attr("exponential"),
            Some(ScaleMode::Exponential)
        );
        assert_eq!(
            ScaleMode::from_attr("LOGARITHMIC"),
            Some(ScaleMode::Logarithmic)
        );
        assert_eq!(ScaleMode::from_attr("quadratic"), None);
    }
}
