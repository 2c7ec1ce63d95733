use chrono::{DateTime, FixedOffset, Locale, Utc};
use meteo_core::{
    RecentSearches, TemperatureVisualization, UnitSystem, WeatherView, provider::icon_url,
};

const TRACK_WIDTH: usize = 31;
const HEADER_DATE_FORMAT: &str = "%A, %d %B %Y, %H:%M";

pub fn render_view(view: &WeatherView) -> String {
    render_view_at(view, Utc::now())
}

/// Render `view` as seen at `now` (the header shows the location's local time).
pub fn render_view_at(view: &WeatherView, now: DateTime<Utc>) -> String {
    let snap = &view.report.snapshot;
    let offset = snap.utc_offset();
    let temp = view.units.temperature_suffix();

    let header_date =
        local(now, offset).format_localized(HEADER_DATE_FORMAT, Locale::ro_RO);
    let mut lines = vec![
        snap.city_name.clone(),
        header_date.to_string(),
        format!(
            "  {}{temp}  {}  (se simte ca {}{temp})",
            snap.temperature.round(),
            snap.description,
            snap.feels_like.round(),
        ),
        format!(
            "  Umiditate {}%  Presiune {} hPa  Vânt {} {}",
            snap.humidity_pct,
            snap.pressure_hpa,
            snap.wind_speed,
            view.units.wind_speed_suffix(),
        ),
        format!(
            "  Răsărit {}  Apus {}",
            local(snap.sunrise, offset).format("%H:%M"),
            local(snap.sunset, offset).format("%H:%M"),
        ),
    ];
    if !snap.icon.is_empty() {
        lines.push(format!("  {}", icon_url(&snap.icon, 4)));
    }
    if let Some(vis) = &view.visualization {
        lines.push(format!("  {}", render_scale(vis, view.units)));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// `18° [------●------] 26°`, current reading below the indicator's slot.
pub fn render_scale(vis: &TemperatureVisualization, units: UnitSystem) -> String {
    let slot = ((vis.position / 100.0) * (TRACK_WIDTH - 1) as f64).round() as usize;
    let track: String = (0..TRACK_WIDTH)
        .map(|i| if i == slot { '●' } else { '-' })
        .collect();

    format!(
        "{}° [{track}] {}°  acum {}{}",
        vis.min_temp,
        vis.max_temp,
        vis.current_temp,
        units.temperature_suffix()
    )
}

pub fn render_recent(recent: &RecentSearches) -> String {
    if recent.is_empty() {
        return "Nicio căutare recentă.\n".to_string();
    }

    recent
        .iter()
        .enumerate()
        .map(|(i, city)| format!("{}. {city}\n", i + 1))
        .collect()
}

fn local(instant: DateTime<Utc>, offset: FixedOffset) -> DateTime<FixedOffset> {
    instant.with_timezone(&offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use meteo_core::{
        ForecastSeries, WeatherReport, WeatherSnapshot, analyzer::visualize_report,
    };

    fn view(units: UnitSystem) -> WeatherView {
        let sunrise = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let report = WeatherReport {
            snapshot: WeatherSnapshot {
                city_name: "Cluj-Napoca".into(),
                temperature: 21.6,
                feels_like: 20.2,
                temp_min: 18.0,
                temp_max: 26.0,
                humidity_pct: 48,
                pressure_hpa: 1014,
                wind_speed: 3.6,
                description: "cer senin".into(),
                icon: "01d".into(),
                sunrise,
                sunset: sunrise + chrono::Duration::hours(10),
                timezone_offset: 7200,
                observation_time: sunrise,
            },
            forecast: ForecastSeries::default(),
        };
        let visualization = visualize_report(&report);
        WeatherView {
            report,
            visualization,
            units,
        }
    }

    #[test]
    fn renders_snapshot_in_local_time() {
        let v = view(UnitSystem::Metric);
        let now = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let text = render_view_at(&v, now);

        assert!(text.starts_with("Cluj-Napoca\n"));
        assert!(text.ends_with('\n'));
        assert!(text.contains("22°C  cer senin"));
        assert!(text.contains("Vânt 3.6 m/s"));
        // 22:13 UTC at +02:00
        assert!(text.contains("Răsărit 00:13"));
        assert!(text.contains("openweathermap.org/img/wn/01d@4x.png"));
    }

    #[test]
    fn header_date_uses_romanian_names() {
        let now = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let text = render_view_at(&view(UnitSystem::Metric), now);

        let header = text.lines().nth(1).unwrap();
        assert_eq!(header, "miercuri, 15 noiembrie 2023, 00:13");
    }

    #[test]
    fn imperial_suffixes() {
        let text = render_view_at(&view(UnitSystem::Imperial), Utc::now());
        assert!(text.contains("°F"));
        assert!(text.contains("mph"));
    }

    #[test]
    fn scale_places_indicator_by_position() {
        let vis = TemperatureVisualization {
            min_temp: 18,
            max_temp: 26,
            current_temp: 22,
            position: 50.0,
        };
        let line = render_scale(&vis, UnitSystem::Metric);

        let track: Vec<char> = line
            .split('[')
            .nth(1)
            .and_then(|s| s.split(']').next())
            .unwrap()
            .chars()
            .collect();
        assert_eq!(track.len(), TRACK_WIDTH);
        assert_eq!(track[TRACK_WIDTH / 2], '●');
    }

    #[test]
    fn recent_list_rendering() {
        let empty = render_recent(&RecentSearches::new());
        assert_eq!(empty, "Nicio căutare recentă.\n");

        let recent = RecentSearches::from_entries(["Sibiu", "Cluj"]);
        assert_eq!(render_recent(&recent), "1. Sibiu\n2. Cluj\n");
    }
}
