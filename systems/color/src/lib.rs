#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Color generation for Tint Tap levels.
//!
//! Base colors are drawn uniformly and then filtered by perceived luminance so
//! that tiles are neither too dark nor too bright to compare. Odd colors are
//! derived from the base by splitting a level's delta across one to three
//! channels.

use rand::{seq::SliceRandom, Rng};
use tint_tap_core::{ColorChannel, ColorConfig, Rgb};

/// Draws allowed before the luminance filter gives up and rescales.
pub const LUMA_ATTEMPTS: usize = 40;

/// Share of the delta applied to the first, second and third varied channel.
const DELTA_SPLIT: [f64; 3] = [0.7, 0.2, 0.1];

/// Perceived luminance of a color using Rec. 601 weights, in `[0, 255]`.
#[must_use]
pub fn luminance(color: Rgb) -> f64 {
    0.299 * f64::from(color.red()) + 0.587 * f64::from(color.green()) + 0.114 * f64::from(color.blue())
}

/// Draws a base color whose luminance falls inside the configured window.
///
/// When every attempt misses, the last draw is scaled toward the window's
/// midpoint. The scaled color usually lands inside the window but is not
/// guaranteed to.
pub fn random_base_color<R: Rng + ?Sized>(config: &ColorConfig, rng: &mut R) -> Rgb {
    let [min, max] = config.base_luma_clamp;
    let mut candidate = Rgb::new(0, 0, 0);
    for _ in 0..LUMA_ATTEMPTS {
        candidate = Rgb::new(rng.gen(), rng.gen(), rng.gen());
        let luma = luminance(candidate);
        if (min..=max).contains(&luma) {
            return candidate;
        }
    }

    let factor = (((min + max) / 2.0) / 128.0).clamp(0.5, 1.5);
    let scaled = Rgb::new(
        clamp_channel(f64::from(candidate.red()) * factor),
        clamp_channel(f64::from(candidate.green()) * factor),
        clamp_channel(f64::from(candidate.blue()) * factor),
    );
    tracing::debug!(
        factor,
        luma = luminance(scaled),
        min,
        max,
        "base color fell back to luminance scaling"
    );
    scaled
}

/// Derives the odd color from a base color and a channel delta.
///
/// Varied channels are taken in random order; the first receives 70% of the
/// delta, the second 20% and the third 10%, each with a random sign. A shift
/// that would leave the channel range is mirrored once before clamping.
pub fn odd_color_from<R: Rng + ?Sized>(
    base: Rgb,
    delta: u32,
    config: &ColorConfig,
    rng: &mut R,
) -> Rgb {
    let mut channels: Vec<ColorChannel> = match &config.channels_to_vary {
        Some(channels) if !channels.is_empty() => channels.clone(),
        _ => ColorChannel::ALL.to_vec(),
    };
    channels.shuffle(rng);

    let delta = f64::from(delta);
    let mut odd = base;
    for (channel, share) in channels.into_iter().zip(DELTA_SPLIT) {
        let amount = delta * share;
        let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        let current = f64::from(base.channel(channel));
        let mut shifted = current + sign * amount;
        if !(0.0..=255.0).contains(&shifted) {
            shifted = current - sign * amount;
        }
        odd = odd.with_channel(channel, clamp_channel(shifted));
    }
    odd
}

/// Formats a color as a CSS `rgb()` literal.
#[must_use]
pub fn to_css_color(color: Rgb) -> String {
    format!("rgb({}, {}, {})", color.red(), color.green(), color.blue())
}

fn clamp_channel(value: f64) -> u8 {
    value.clamp(0.0, 255.0).round() as u8
}
