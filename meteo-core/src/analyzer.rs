//! Temperature math used by the display: the 24-hour range taken from the
//! forecast and the position of the current reading on a bounded scale.

use serde::Serialize;

use crate::model::{ForecastSeries, WeatherReport};

/// Number of 3-hour forecast samples covering roughly one day.
pub const DAILY_WINDOW: usize = 8;

const POSITION_FLOOR: f64 = 5.0;
const POSITION_CEIL: f64 = 95.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TemperatureRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TemperatureVisualization {
    pub min_temp: i64,
    pub max_temp: i64,
    pub current_temp: i64,
    /// Indicator position along the track, in percent. Always within [5, 95].
    pub position: f64,
}

/// Min/max over the first [`DAILY_WINDOW`] samples, or `None` for an empty series.
pub fn daily_range(series: &ForecastSeries) -> Option<TemperatureRange> {
    let mut window = series
        .samples
        .iter()
        .take(DAILY_WINDOW)
        .map(|s| s.temperature);
    let first = window.next()?;

    let (min, max) = window.fold((first, first), |(min, max), t| (min.min(t), max.max(t)));
    Some(TemperatureRange { min, max })
}

/// Map `current` onto the `[min, max]` scale.
///
/// The bounds are first widened so they contain `current`, then all three
/// values are rounded to whole degrees and the position is computed from the
/// rounded values. Returns `None` if any input is not a finite number.
pub fn visualize(current: f64, min: f64, max: f64) -> Option<TemperatureVisualization> {
    if !(current.is_finite() && min.is_finite() && max.is_finite()) {
        return None;
    }

    let min = round_half_up(min.min(current));
    let max = round_half_up(max.max(current));
    let current = round_half_up(current);

    let position = if max != min {
        (current - min) as f64 / (max - min) as f64 * 100.0
    } else {
        50.0
    };

    Some(TemperatureVisualization {
        min_temp: min,
        max_temp: max,
        current_temp: current,
        position: position.clamp(POSITION_FLOOR, POSITION_CEIL),
    })
}

/// Visualization for a full report. The forecast window supplies the bounds;
/// when the forecast is empty the snapshot's own min/max are used instead.
pub fn visualize_report(report: &WeatherReport) -> Option<TemperatureVisualization> {
    let snapshot = &report.snapshot;
    let range = daily_range(&report.forecast).unwrap_or(TemperatureRange {
        min: snapshot.temp_min,
        max: snapshot.temp_max,
    });

    visualize(snapshot.temperature, range.min, range.max)
}

// Halves go toward +inf, so -2.5 becomes -2. `value - floor` is exact,
// unlike `value + 0.5`.
fn round_half_up(value: f64) -> i64 {
    let floor = value.floor();
    let rounded = if value - floor >= 0.5 { floor + 1.0 } else { floor };
    rounded as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ForecastSample, WeatherSnapshot};
    use chrono::{DateTime, Utc};

    fn series(temps: &[f64]) -> ForecastSeries {
        let samples = temps
            .iter()
            .enumerate()
            .map(|(i, t)| ForecastSample {
                time: DateTime::<Utc>::from_timestamp(1_700_000_000 + i as i64 * 10_800, 0)
                    .unwrap(),
                temperature: *t,
            })
            .collect();
        ForecastSeries::new(samples)
    }

    #[test]
    fn daily_range_of_short_series() {
        let range = daily_range(&series(&[10.0, 15.0, 5.0])).unwrap();
        assert_eq!(
            range,
            TemperatureRange {
                min: 5.0,
                max: 15.0,
            }
        );
    }

    #[test]
    fn daily_range_of_empty_series_is_none() {
        assert!(daily_range(&ForecastSeries::default()).is_none());
    }

    #[test]
    fn daily_range_ignores_samples_past_the_first_eight() {
        let temps = [3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, -40.0, 60.0];
        let range = daily_range(&series(&temps)).unwrap();
        assert_eq!(
            range,
            TemperatureRange {
                min: 3.0,
                max: 10.0,
            }
        );
    }

    #[test]
    fn daily_range_single_sample() {
        let range = daily_range(&series(&[7.5])).unwrap();
        assert_eq!(range, TemperatureRange { min: 7.5, max: 7.5 });
    }

    #[test]
    fn visualize_midpoint() {
        let v = visualize(22.0, 18.0, 26.0).unwrap();
        assert_eq!(
            v,
            TemperatureVisualization {
                min_temp: 18,
                max_temp: 26,
                current_temp: 22,
                position: 50.0,
            }
        );
    }

    #[test]
    fn visualize_equal_bounds_is_centered() {
        let v = visualize(12.0, 12.0, 12.0).unwrap();
        assert_eq!(v.position, 50.0);
    }

    #[test]
    fn visualize_widens_bounds_to_include_current() {
        let v = visualize(-3.4, 2.0, 9.0).unwrap();
        assert_eq!(v.min_temp, -3);
        assert_eq!(v.current_temp, -3);
        assert_eq!(v.position, 5.0);

        let v = visualize(31.6, 20.0, 28.0).unwrap();
        assert_eq!(v.max_temp, 32);
        assert_eq!(v.position, 95.0);
    }

    #[test]
    fn visualize_position_is_clamped_for_in_range_values() {
        let cases = [
            (0.0, 0.0, 100.0),
            (100.0, 0.0, 100.0),
            (1.0, 0.0, 100.0),
            (50.0, 0.0, 100.0),
        ];
        for (current, min, max) in cases {
            let v = visualize(current, min, max).unwrap();
            assert!(
                (5.0..=95.0).contains(&v.position),
                "position {} out of range",
                v.position
            );
        }
    }

    #[test]
    fn visualize_rounds_halves_up() {
        let v = visualize(-2.5, -10.0, 0.5).unwrap();
        assert_eq!(v.current_temp, -2);
        assert_eq!(v.max_temp, 1);
    }

    #[test]
    fn visualize_rounds_value_just_below_half_down() {
        let v = visualize(0.49999999999999994, 0.0, 10.0).unwrap();
        assert_eq!(v.current_temp, 0);
        let big = 4_503_599_627_370_497.0;
        assert_eq!(round_half_up(big), 4_503_599_627_370_497);
    }

    #[test]
    fn visualize_rejects_non_finite_input() {
        assert!(visualize(f64::NAN, 1.0, 2.0).is_none());
        assert!(visualize(1.0, f64::NEG_INFINITY, 2.0).is_none());
    }

    #[test]
    fn visualize_report_falls_back_to_snapshot_bounds() {
        let now = Utc::now();
        let report = WeatherReport {
            snapshot: WeatherSnapshot {
                city_name: "Cluj-Napoca".into(),
                temperature: 14.0,
                feels_like: 13.0,
                temp_min: 10.0,
                temp_max: 18.0,
                humidity_pct: 60,
                pressure_hpa: 1012,
                wind_speed: 2.1,
                description: "cer senin".into(),
                icon: "01d".into(),
                sunrise: now,
                sunset: now,
                timezone_offset: 10_800,
                observation_time: now,
            },
            forecast: ForecastSeries::default(),
        };

        let v = visualize_report(&report).unwrap();
        assert_eq!((v.min_temp, v.max_temp, v.current_temp), (10, 18, 14));
        assert_eq!(v.position, 50.0);
    }
}
