use crate::logic::forecast_series::{forecast_series, peak_demand, schedule_series};
use crate::logic::notes::parse_notes;
use crate::logic::service::Dashboard;
use crate::logic::summary::summarize_week;
use crate::logic::weather_summary::parse_weather_summary;
use crate::models::{FieldSummary, IrrigationRecommendation, WeeklyIrrigationSchedule};
use crate::ui::Theme;
use crossterm::style::ContentStyle;
use std::io::{self, Write};

fn paint<D: std::fmt::Display>(style: ContentStyle, text: D) -> crossterm::style::StyledContent<D> {
    style.apply(text)
}

pub struct DashboardReport<'a> {
    pub dashboard: &'a Dashboard,
    pub farm_name: Option<&'a str>,
}

impl<'a> DashboardReport<'a> {
    pub fn new(dashboard: &'a Dashboard) -> Self {
        Self {
            dashboard,
            farm_name: None,
        }
    }

    pub fn with_farm_name(mut self, name: Option<&'a str>) -> Self {
        self.farm_name = name;
        self
    }

    pub fn render<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let summary = &self.dashboard.summary;
        let title = match self.farm_name {
            Some(name) => format!("Зрошення: {}", name),
            None => "Зрошення".to_string(),
        };
        writeln!(out, "{}", paint(Theme::title(), title))?;
        writeln!(
            out,
            "  Полів: {}   До поливу: {}   Критичних: {}   Потреба у воді: {:.1} мм",
            summary.total_fields,
            paint(Theme::header(), summary.fields_to_irrigate),
            paint(Theme::error(), summary.critical_field_count),
            summary.total_water_needed,
        )?;
        writeln!(out)?;

        for rec in &self.dashboard.recommendations {
            let style = rec.recommended_action.style();
            writeln!(
                out,
                "  {:>4}  {:<24} {} {:<16} {:>6.1} мм  {}",
                rec.field_id,
                rec.field_name,
                style.icon.symbol(),
                paint(Theme::badge(style.tone), style.label),
                rec.gross_irrigation_requirement,
                paint(Theme::dim(), &rec.crop_stage),
            )?;
        }
        Ok(())
    }
}

pub struct RecommendationReport<'a> {
    pub rec: &'a IrrigationRecommendation,
}

impl<'a> RecommendationReport<'a> {
    pub fn new(rec: &'a IrrigationRecommendation) -> Self {
        Self { rec }
    }

    pub fn render<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let rec = self.rec;
        let style = rec.recommended_action.style();

        writeln!(
            out,
            "{} ({})",
            paint(Theme::title(), format!("{} #{}", rec.field_name, rec.field_id)),
            rec.date
        )?;
        writeln!(
            out,
            "  {} {}",
            style.icon.symbol(),
            paint(Theme::badge(style.tone), rec.recommended_action.as_str())
        )?;
        writeln!(
            out,
            "  ET0 {:.2}  Kc {:.2}  ETc {:.2}  Опади {:.1} (ефект. {:.1})",
            rec.et0, rec.kc, rec.etc, rec.precipitation, rec.effective_precipitation
        )?;
        writeln!(
            out,
            "  Нетто {:.1} мм  Брутто {:.1} мм  Вологість ґрунту {}",
            rec.net_irrigation_requirement,
            rec.gross_irrigation_requirement,
            paint(
                Theme::color(Theme::moisture_color(rec.soil_moisture)),
                format!("{:.0}%", rec.soil_moisture * 100.0)
            ),
        )?;
        if !rec.crop_stage.is_empty() {
            writeln!(out, "  Фаза: {}", rec.crop_stage)?;
        }

        let notes: Vec<_> = parse_notes(&rec.notes).collect();
        if !notes.is_empty() {
            writeln!(out)?;
            writeln!(out, "{}", paint(Theme::header(), "Примітки"))?;
            for note in notes {
                writeln!(
                    out,
                    "  {} {}",
                    note.icon.symbol(),
                    paint(Theme::badge(note.tone), note.text)
                )?;
            }
        }

        let points = forecast_series(rec);
        if !points.is_empty() {
            writeln!(out)?;
            writeln!(out, "{}", paint(Theme::header(), "Прогноз"))?;
            let peak = peak_demand(&points).map(|p| p.date);
            for point in &points {
                let marker = if Some(point.date) == peak { "▲" } else { " " };
                writeln!(
                    out,
                    "  {} {}  ETc {:>5.2}  Опади {:>5.1}  Брутто {:>5.1}",
                    marker, point.label, point.etc, point.precipitation, point.gross
                )?;
            }
        }
        Ok(())
    }
}

pub struct WeeklyReport<'a> {
    pub schedule: &'a WeeklyIrrigationSchedule,
}

impl<'a> WeeklyReport<'a> {
    pub fn new(schedule: &'a WeeklyIrrigationSchedule) -> Self {
        Self { schedule }
    }

    pub fn render<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let week = self.schedule;
        let summary = summarize_week(week);

        writeln!(
            out,
            "{} {}..{}",
            paint(Theme::title(), format!("{} #{}", week.field_name, week.field_id)),
            week.start_date,
            week.end_date
        )?;
        if !week.crop_type.is_empty() {
            writeln!(out, "  Культура: {}", week.crop_type)?;
        }
        writeln!(
            out,
            "  Днів поливу: {}  Потреба: {:.1} мм  Опади: {:.1} мм",
            paint(Theme::header(), summary.irrigation_days),
            summary.total_water_requirement,
            summary.total_expected_precipitation
        )?;
        writeln!(out)?;

        let points = schedule_series(week);
        for (day, point) in week.daily_schedule.iter().zip(&points) {
            let flag = if day.should_irrigate {
                paint(Theme::success(), "💧 полив")
            } else {
                paint(Theme::dim(), "   —   ")
            };
            let weather: Vec<String> = parse_weather_summary(&day.weather_summary)
                .into_iter()
                .map(|w| format!("{} {}", w.icon.symbol(), paint(Theme::badge(w.tone), w.text)))
                .collect();
            writeln!(
                out,
                "  {} {:<10} {}  {:>5.1} мм  {:<11} {}",
                point.label,
                day.day_of_week,
                flag,
                point.gross,
                day.recommended_time,
                weather.join(", ")
            )?;
        }

        if !week.recommendations.trim().is_empty() {
            writeln!(out)?;
            for note in parse_notes(&week.recommendations) {
                writeln!(
                    out,
                    "  {} {}",
                    note.icon.symbol(),
                    paint(Theme::badge(note.tone), note.text)
                )?;
            }
        }
        Ok(())
    }
}

pub fn render_fields<W: Write>(out: &mut W, fields: &[FieldSummary]) -> io::Result<()> {
    writeln!(out, "{}", paint(Theme::title(), "Поля"))?;
    for field in fields {
        writeln!(
            out,
            "  {:>4}  {:<24} {:<12} {}",
            field.id,
            field.name,
            field.crop_type.as_deref().unwrap_or("—"),
            field
                .area
                .map(|a| format!("{:.1} га", a))
                .unwrap_or_default()
        )?;
    }
    Ok(())
}

pub fn render_error<W: Write>(out: &mut W, context: &str, error: &dyn std::fmt::Display) -> io::Result<()> {
    writeln!(
        out,
        "{} {}: {}",
        paint(Theme::error(), "✗"),
        context,
        error
    )
}
