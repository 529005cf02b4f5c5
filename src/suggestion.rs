//! Activity suggestions derived from current conditions
//!
//! Numeric thresholds are applied to the raw values as fetched, without unit
//! conversion, so the bands are calibrated for metric data.

/// Fallback when no rule matches
pub const DEFAULT_SUGGESTION: &str = "Enjoy your day!";

const HOT_ABOVE: f64 = 30.0;
const WARM_ABOVE: f64 = 20.0;
const COLD_BELOW: f64 = 10.0;
const WINDY_ABOVE: f64 = 20.0;
const HUMID_ABOVE: f64 = 80.0;

/// Pick an activity suggestion for the given conditions.
///
/// Description rules come first, in priority order, then the numeric bands.
#[must_use]
pub fn suggest(description: &str, temperature: f64, wind_speed: f64, humidity_pct: f64) -> &'static str {
    let d = description.trim().to_lowercase();

    let rules: [(bool, &'static str); 12] = [
        (d.contains("rain"), "Grab an umbrella!"),
        (d.contains("snow"), "It's snowing! Stay warm and enjoy the atmosphere!"),
        (
            d.contains("storm"),
            "Thunderstorms are rolling in! Stay inside if possible, and avoid tall trees and open fields.",
        ),
        (d == "clear sky", "It's a nice day for a jog!"),
        (
            d == "few clouds" || d == "scattered clouds",
            "Perfect weather for a walk or a trip to the park!",
        ),
        (
            d.contains("cloud"),
            "It's a great time for indoor activities, or an adventurous walk outside!",
        ),
        (
            d == "mist" || d.contains("fog"),
            "Perfect for a quiet walk, but be mindful of lower visibility!",
        ),
        (temperature > HOT_ABOVE, "It's hot out there! Stay hydrated and find some shade."),
        (temperature > WARM_ABOVE, "Warm weather, great for getting outdoors!"),
        (temperature < COLD_BELOW, "It's chilly, bundle up before heading out!"),
        (
            wind_speed > WINDY_ABOVE,
            "It's windy! Maybe skip the umbrella and hold on to your hat.",
        ),
        (
            humidity_pct > HUMID_ABOVE,
            "It's humid, take it easy if you're exercising outside.",
        ),
    ];

    rules
        .iter()
        .find(|(matched, _)| *matched)
        .map_or(DEFAULT_SUGGESTION, |(_, message)| *message)
}
