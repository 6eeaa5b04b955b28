//! Service level to safety factor lookup

/// Canonical service levels and their standard normal quantiles
pub const Z_TABLE: [(f64, f64); 6] = [
    (0.8, 0.8416),
    (0.85, 1.036),
    (0.9, 1.2816),
    (0.95, 1.6449),
    (0.975, 1.96),
    (0.99, 2.326),
];

/// Safety factor used for service levels outside [`Z_TABLE`]
pub const FALLBACK_Z: f64 = 1.28;

/// Safety factor for `service_level`.
///
/// The level is rounded to three decimals and looked up in [`Z_TABLE`].
/// Anything else gets [`FALLBACK_Z`], which only approximates the normal
/// quantile near 0.9.
pub fn z_for_service_level(service_level: f64) -> f64 {
    let rounded = (service_level * 1000.0).round() / 1000.0;
    Z_TABLE
        .iter()
        .find(|(level, _)| *level == rounded)
        .map_or(FALLBACK_Z, |(_, z)| *z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0.8, 0.8416)]
    #[case(0.85, 1.036)]
    #[case(0.9, 1.2816)]
    #[case(0.95, 1.6449)]
    #[case(0.975, 1.96)]
    #[case(0.99, 2.326)]
    #[case(0.9000001, 1.2816)]
    #[case(0.5, 1.28)]
    #[case(0.97, 1.28)]
    #[case(0.999, 1.28)]
    fn test_z_lookup(#[case] service_level: f64, #[case] expected: f64) {
        assert_relative_eq!(z_for_service_level(service_level), expected);
    }
}
