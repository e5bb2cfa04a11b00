use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tint_tap_core::{ColorChannel, ColorConfig, Rgb};
use tint_tap_system_color::{luminance, odd_color_from, random_base_color, to_css_color};

#[test]
fn base_colors_mostly_land_inside_luma_window() {
    let config = ColorConfig::default();
    let [min, max] = config.base_luma_clamp;
    let mut rng = ChaCha8Rng::seed_from_u64(0x7157);

    let draws = 500;
    let inside = (0..draws)
        .map(|_| random_base_color(&config, &mut rng))
        .filter(|color| (min..=max).contains(&luminance(*color)))
        .count();

    assert!(inside >= 490, "only {inside} of {draws} draws hit the window");
}

#[test]
fn unreachable_window_falls_back_without_panicking() {
    let config = ColorConfig {
        base_luma_clamp: [254.9, 255.0],
        channels_to_vary: None,
    };
    let first = random_base_color(&config, &mut ChaCha8Rng::seed_from_u64(3));
    let second = random_base_color(&config, &mut ChaCha8Rng::seed_from_u64(3));

    assert_eq!(first, second, "fallback must stay deterministic per seed");
}

#[test]
fn odd_color_differs_for_positive_delta() {
    let config = ColorConfig::default();
    let mut rng = ChaCha8Rng::seed_from_u64(99);

    for delta in [1, 4, 8, 25, 60] {
        for _ in 0..100 {
            let base = random_base_color(&config, &mut rng);
            let odd = odd_color_from(base, delta, &config, &mut rng);
            assert_ne!(base, odd, "delta {delta} produced an identical odd color");
        }
    }
}

#[test]
fn odd_color_only_touches_configured_channels() {
    let config = ColorConfig {
        base_luma_clamp: [60.0, 200.0],
        channels_to_vary: Some(vec![ColorChannel::Green]),
    };
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let base = Rgb::new(120, 130, 140);

    for _ in 0..50 {
        let odd = odd_color_from(base, 40, &config, &mut rng);
        assert_eq!(odd.red(), base.red());
        assert_eq!(odd.blue(), base.blue());
        assert_eq!(i32::from(odd.green()).abs_diff(130), 28);
    }
}

#[test]
fn shift_mirrors_away_from_saturated_channel() {
    let config = ColorConfig {
        base_luma_clamp: [0.0, 255.0],
        channels_to_vary: Some(vec![ColorChannel::Red]),
    };
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let base = Rgb::new(255, 0, 0);

    for _ in 0..20 {
        let odd = odd_color_from(base, 50, &config, &mut rng);
        assert_eq!(odd.red(), 220);
    }
}

#[test]
fn css_color_formats_channels() {
    assert_eq!(to_css_color(Rgb::new(12, 200, 7)), "rgb(12, 200, 7)");
}
