//! Forecast handling and rule-based farming advice.

use crate::temporal::DateValue;
use serde::Serialize;
use std::str::FromStr;

use crate::record::ParseVariantError;

/// Sky conditions reported by the forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherCondition {
    /// Clear skies.
    #[default]
    Sunny,
    /// Overcast.
    Cloudy,
    /// Rain.
    Rainy,
    /// Thunderstorms.
    Stormy,
    /// Snow.
    Snowy,
    /// Fog.
    Foggy,
}

impl WeatherCondition {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sunny => "sunny",
            Self::Cloudy => "cloudy",
            Self::Rainy => "rainy",
            Self::Stormy => "stormy",
            Self::Snowy => "snowy",
            Self::Foggy => "foggy",
        }
    }
}

impl FromStr for WeatherCondition {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sunny" => Ok(Self::Sunny),
            "cloudy" => Ok(Self::Cloudy),
            "rainy" => Ok(Self::Rainy),
            "stormy" => Ok(Self::Stormy),
            "snowy" => Ok(Self::Snowy),
            "foggy" => Ok(Self::Foggy),
            _ => Err(ParseVariantError {
                kind: "weather condition",
                token: s.to_owned(),
            }),
        }
    }
}

/// One day of forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherDay {
    /// Forecast date.
    pub date: DateValue,
    /// Sky conditions.
    pub condition: WeatherCondition,
    /// High temperature (°F).
    pub high: f64,
    /// Low temperature (°F).
    pub low: f64,
    /// Chance of precipitation (%).
    pub precipitation: f64,
    /// Relative humidity (%).
    pub humidity: f64,
    /// Wind speed (mph).
    pub wind_speed: f64,
}

/// Tone of an advice line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdviceKind {
    /// Conditions that call for action.
    Warning,
    /// Worth knowing.
    Info,
    /// Nothing to worry about.
    Success,
}

/// A single line of advice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Advice {
    /// Tone.
    pub kind: AdviceKind,
    /// Message shown to the farmer.
    pub message: &'static str,
}

const HEAVY_RAIN_PRECIPITATION: f64 = 60.0;
const HOT_HIGH: f64 = 85.0;
const COLD_LOW: f64 = 40.0;
const STRONG_WIND: f64 = 20.0;
const DRY_HUMIDITY: f64 = 30.0;

/// The first `days` entries of a forecast.
#[must_use]
pub fn forecast(days: &[WeatherDay], count: usize) -> &[WeatherDay] {
    &days[..count.min(days.len())]
}

/// Advice for a day, in rule order; never empty.
#[must_use]
pub fn advice(day: &WeatherDay) -> Vec<Advice> {
    let rules = [
        (
            day.condition == WeatherCondition::Rainy && day.precipitation > HEAVY_RAIN_PRECIPITATION,
            AdviceKind::Warning,
            "Heavy rain expected - postpone outdoor planting and harvesting",
        ),
        (
            day.high > HOT_HIGH,
            AdviceKind::Info,
            "High temperatures - ensure adequate irrigation for crops",
        ),
        (
            day.low < COLD_LOW,
            AdviceKind::Warning,
            "Cold night ahead - protect sensitive plants from frost",
        ),
        (
            day.wind_speed > STRONG_WIND,
            AdviceKind::Warning,
            "Strong winds - secure equipment and check plant supports",
        ),
        (
            day.humidity < DRY_HUMIDITY,
            AdviceKind::Info,
            "Low humidity - increase watering frequency",
        ),
    ];

    let mut lines: Vec<Advice> = rules
        .into_iter()
        .filter(|(fired, _, _)| *fired)
        .map(|(_, kind, message)| Advice { kind, message })
        .collect();
    if lines.is_empty() {
        lines.push(Advice {
            kind: AdviceKind::Success,
            message: "Great weather conditions for most farm activities",
        });
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mild() -> WeatherDay {
        WeatherDay {
            date: DateValue::text("2024-06-15"),
            condition: WeatherCondition::Sunny,
            high: 75.0,
            low: 55.0,
            precipitation: 10.0,
            humidity: 50.0,
            wind_speed: 5.0,
        }
    }

    #[test]
    fn mild_day_gets_success_advice() {
        let lines = advice(&mild());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].kind, AdviceKind::Success);
    }

    #[test]
    fn rules_fire_in_order() {
        let day = WeatherDay {
            condition: WeatherCondition::Rainy,
            precipitation: 80.0,
            low: 35.0,
            humidity: 20.0,
            ..mild()
        };
        let kinds: Vec<_> = advice(&day).iter().map(|line| line.kind).collect();
        assert_eq!(kinds, vec![AdviceKind::Warning, AdviceKind::Warning, AdviceKind::Info]);
        assert!(advice(&day)[0].message.starts_with("Heavy rain"));
    }

    #[test]
    fn thresholds_are_strict() {
        let day = WeatherDay {
            condition: WeatherCondition::Rainy,
            precipitation: 60.0,
            high: 85.0,
            low: 40.0,
            wind_speed: 20.0,
            humidity: 30.0,
            ..mild()
        };
        assert_eq!(advice(&day)[0].kind, AdviceKind::Success);
    }

    #[test]
    fn forecast_truncates_without_panicking() {
        let days = vec![mild(), mild()];
        assert_eq!(forecast(&days, 5).len(), 2);
        assert_eq!(forecast(&days, 1).len(), 1);
        assert!(forecast(&days, 0).is_empty());
    }
}
