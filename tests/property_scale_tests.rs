use proptest::prelude::*;
use riskchart::core::PriceScale;

proptest! {
    #[test]
    fn pixel_round_trip_property(
        price_min in -1_000_000.0f64..1_000_000.0,
        price_span in 0.001f64..1_000_000.0,
        y_factor in 0.0f64..1.0,
        pane_height in 50.0f64..4_000.0
    ) {
        let scale = PriceScale::new(price_min, price_min + price_span).expect("valid scale");
        let y = y_factor * pane_height;

        let price = scale.pixel_to_price(y, pane_height);
        let recovered = scale.price_to_pixel(price, pane_height);

        prop_assert!((recovered - y).abs() <= 1e-6 * pane_height);
    }

    #[test]
    fn tick_generation_property(
        price_min in -1_000_000.0f64..1_000_000.0,
        price_span in 0.001f64..1_000_000.0
    ) {
        let price_max = price_min + price_span;
        let scale = PriceScale::new(price_min, price_max).expect("valid scale");
        let ticks = scale.ticks();

        prop_assert_eq!(ticks.len(), 8);
        prop_assert!((ticks[0] - price_min).abs() <= 1e-9 * price_span.max(1.0));
        prop_assert!((ticks[7] - price_max).abs() <= 1e-9 * price_span.max(1.0));
        for pair in ticks.windows(2) {
            prop_assert!(pair[1] >= pair[0]);
        }
    }

    #[test]
    fn mapping_never_produces_non_finite(
        price_min in -1_000_000.0f64..1_000_000.0,
        price_span in 0.0f64..1_000_000.0,
        price in -2_000_000.0f64..2_000_000.0,
        pane_height in 1.0f64..4_000.0
    ) {
        // Zero spans are allowed here on purpose: collapsed domains must
        // degrade to the pane center, never NaN/Infinity.
        let scale = PriceScale::new(price_min, price_min + price_span).expect("valid scale");

        prop_assert!(scale.price_to_pixel(price, pane_height).is_finite());
        prop_assert!(scale.pixel_to_price(price, pane_height).is_finite());
    }
}
