use skyview_core::{Background, FormattedWeather, model::format_temperature};
use std::fmt::Write;

/// Multi-line, human-readable view of a weather record.
pub fn weather(w: &FormattedWeather, background: Background) -> String {
    let units = w.units;
    let mut out = String::new();

    let _ = writeln!(out, "{}, {}  ({})", w.name, w.country, w.formatted_local_time);
    let _ = writeln!(out, "  {}  {}", w.display_temp(), w.description);
    let _ = writeln!(out, "  icon:        {}", w.icon_url);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "  min / max:   {} / {}",
        format_temperature(w.temp_min, units),
        format_temperature(w.temp_max, units)
    );
    let _ = writeln!(out, "  feels like:  {}", format_temperature(w.feels_like, units));
    let _ = writeln!(out, "  humidity:    {}%", w.humidity);
    let _ = writeln!(out, "  wind:        {:.1} {}", w.speed, units.speed_unit());
    let _ = writeln!(out, "  sunrise:     {}", w.sunrise);
    let _ = writeln!(out, "  sunset:      {}", w.sunset);
    let _ = writeln!(out);

    let days: Vec<String> = w
        .daily
        .iter()
        .map(|d| format!("{} {}", d.title, format_temperature(d.temp, units)))
        .collect();
    let _ = writeln!(out, "  daily:       {}", days.join("  |  "));
    let _ = write!(out, "  background:  {}", background.image());

    out
}
