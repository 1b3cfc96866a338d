//! SVG line charts of the trading history.
//!
//! One renderer covers every chart variant: the chart kind (percent change
//! from each series' first point, or absolute values) and the plotted
//! series are parameters. The x axis is wall-clock time, so series sampled
//! at different instants (snapshots every tick, prices only at trades)
//! share one axis.

use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::str::FromStr;

use crate::domain::history::TradingHistory;

const WIDTH: f64 = 900.0;
const HEIGHT: f64 = 420.0;
const PADDING: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartKind {
    #[default]
    Percent,
    Absolute,
}

impl FromStr for ChartKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "percent" | "pct" => Ok(ChartKind::Percent),
            "absolute" | "abs" => Ok(ChartKind::Absolute),
            other => Err(format!("unknown chart kind '{other}' (expected percent or absolute)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    /// Recorded portfolio values.
    Portfolio,
    /// Asset price at each transaction.
    Price,
}

impl SeriesKind {
    fn label(&self) -> &'static str {
        match self {
            SeriesKind::Portfolio => "Portfolio value",
            SeriesKind::Price => "Asset price",
        }
    }

    fn color(&self) -> &'static str {
        match self {
            SeriesKind::Portfolio => "#d62728",
            SeriesKind::Price => "#7f7f7f",
        }
    }

    fn points(&self, history: &TradingHistory) -> Vec<(DateTime<Utc>, f64)> {
        match self {
            SeriesKind::Portfolio => history
                .portfolio_history
                .iter()
                .map(|s| (s.timestamp, s.portfolio_value))
                .collect(),
            SeriesKind::Price => history
                .transactions
                .iter()
                .map(|t| (t.timestamp, t.price))
                .collect(),
        }
    }
}

impl FromStr for SeriesKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "portfolio" => Ok(SeriesKind::Portfolio),
            "price" => Ok(SeriesKind::Price),
            other => Err(format!("unknown series '{other}' (expected portfolio or price)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartOptions {
    pub kind: ChartKind,
    pub series: Vec<SeriesKind>,
    pub title: String,
}

impl Default for ChartOptions {
    fn default() -> Self {
        ChartOptions {
            kind: ChartKind::Percent,
            series: vec![SeriesKind::Portfolio],
            title: "Portfolio Value Over Time".to_string(),
        }
    }
}

struct Line {
    kind: SeriesKind,
    points: Vec<(DateTime<Utc>, f64)>,
}

fn to_percent(points: &mut [(DateTime<Utc>, f64)]) {
    let Some(&(_, first)) = points.first() else {
        return;
    };
    for (_, v) in points.iter_mut() {
        *v = if first != 0.0 {
            (*v - first) / first * 100.0
        } else {
            0.0
        };
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn render_chart(history: &TradingHistory, options: &ChartOptions) -> String {
    let lines: Vec<Line> = options
        .series
        .iter()
        .map(|&kind| {
            let mut points = kind.points(history);
            if options.kind == ChartKind::Percent {
                to_percent(&mut points);
            }
            Line { kind, points }
        })
        .filter(|line| !line.points.is_empty())
        .collect();

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH:.0}" height="{HEIGHT:.0}" viewBox="0 0 {WIDTH:.0} {HEIGHT:.0}">"#
    );
    let _ = writeln!(svg, r#"  <rect width="100%" height="100%" fill="white"/>"#);
    let _ = writeln!(
        svg,
        r#"  <text x="{:.1}" y="30" font-size="18" text-anchor="middle">{}</text>"#,
        WIDTH / 2.0,
        escape(&options.title)
    );

    if lines.is_empty() {
        let _ = writeln!(
            svg,
            r#"  <text x="{:.1}" y="{:.1}" font-size="14" text-anchor="middle">No data available.</text>"#,
            WIDTH / 2.0,
            HEIGHT / 2.0
        );
        svg.push_str("</svg>\n");
        return svg;
    }

    let all = lines.iter().flat_map(|l| l.points.iter());
    let (mut t_min, mut t_max) = (i64::MAX, i64::MIN);
    let (mut v_min, mut v_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for (t, v) in all {
        let ms = t.timestamp_millis();
        t_min = t_min.min(ms);
        t_max = t_max.max(ms);
        v_min = v_min.min(*v);
        v_max = v_max.max(*v);
    }

    let plot_width = WIDTH - 2.0 * PADDING;
    let plot_height = HEIGHT - 2.0 * PADDING;
    let t_span = (t_max - t_min) as f64;
    let v_span = v_max - v_min;
    let scale_x = if t_span > 0.0 { plot_width / t_span } else { 0.0 };
    let scale_y = if v_span > 0.0 { plot_height / v_span } else { 1.0 };

    // axes
    let _ = writeln!(
        svg,
        r#"  <line x1="{p:.1}" y1="{p:.1}" x2="{p:.1}" y2="{b:.1}" stroke="black"/>"#,
        p = PADDING,
        b = HEIGHT - PADDING
    );
    let _ = writeln!(
        svg,
        r#"  <line x1="{p:.1}" y1="{b:.1}" x2="{r:.1}" y2="{b:.1}" stroke="black"/>"#,
        p = PADDING,
        b = HEIGHT - PADDING,
        r = WIDTH - PADDING
    );

    let unit = match options.kind {
        ChartKind::Percent => "%",
        ChartKind::Absolute => "",
    };
    let _ = writeln!(
        svg,
        r#"  <text x="{:.1}" y="{:.1}" font-size="11" text-anchor="end">{:.2}{unit}</text>"#,
        PADDING - 6.0,
        PADDING + 4.0,
        v_max
    );
    let _ = writeln!(
        svg,
        r#"  <text x="{:.1}" y="{:.1}" font-size="11" text-anchor="end">{:.2}{unit}</text>"#,
        PADDING - 6.0,
        HEIGHT - PADDING,
        v_min
    );

    let fmt_time = |ms: i64| {
        DateTime::<Utc>::from_timestamp_millis(ms)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default()
    };
    let _ = writeln!(
        svg,
        r#"  <text x="{:.1}" y="{:.1}" font-size="11">{}</text>"#,
        PADDING,
        HEIGHT - PADDING + 18.0,
        fmt_time(t_min)
    );
    let _ = writeln!(
        svg,
        r#"  <text x="{:.1}" y="{:.1}" font-size="11" text-anchor="end">{}</text>"#,
        WIDTH - PADDING,
        HEIGHT - PADDING + 18.0,
        fmt_time(t_max)
    );

    for (i, line) in lines.iter().enumerate() {
        let points: Vec<String> = line
            .points
            .iter()
            .map(|(t, v)| {
                let x = PADDING + (t.timestamp_millis() - t_min) as f64 * scale_x;
                let y = HEIGHT - PADDING - (v - v_min) * scale_y;
                format!("{:.1},{:.1}", x, y)
            })
            .collect();
        let _ = writeln!(
            svg,
            r#"  <polyline fill="none" stroke="{}" stroke-width="1.5" points="{}"/>"#,
            line.kind.color(),
            points.join(" ")
        );

        let legend_y = PADDING + 16.0 * i as f64;
        let _ = writeln!(
            svg,
            r#"  <text x="{:.1}" y="{:.1}" font-size="12" fill="{}">{}</text>"#,
            PADDING + 10.0,
            legend_y,
            line.kind.color(),
            line.kind.label()
        );
    }

    svg.push_str("</svg>\n");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::crossover::Signal;
    use crate::domain::history::{PortfolioSnapshot, Transaction};
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_733_835_600 + secs, 0).unwrap()
    }

    fn sample_history() -> TradingHistory {
        let mut history = TradingHistory::new();
        for (i, v) in [10_000.0, 10_500.0, 11_000.0].iter().enumerate() {
            history.record_snapshot(PortfolioSnapshot {
                timestamp: ts(i as i64 * 3),
                portfolio_value: *v,
            });
        }
        history.record_transaction(Transaction {
            timestamp: ts(3),
            action: Signal::Buy,
            price: 100.0,
            holding: 105.0,
            capital: 0.0,
        });
        history
    }

    #[test]
    fn empty_history_renders_placeholder() {
        let svg = render_chart(&TradingHistory::new(), &ChartOptions::default());
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("No data available."));
        assert!(!svg.contains("polyline"));
    }

    #[test]
    fn single_series_draws_one_polyline() {
        let svg = render_chart(&sample_history(), &ChartOptions::default());
        assert_eq!(svg.matches("<polyline").count(), 1);
        assert!(svg.contains("Portfolio value"));
        assert!(svg.contains("Portfolio Value Over Time"));
    }

    #[test]
    fn percent_chart_labels_percent_range() {
        let svg = render_chart(&sample_history(), &ChartOptions::default());
        assert!(svg.contains("10.00%"));
        assert!(svg.contains("0.00%"));
    }

    #[test]
    fn absolute_chart_labels_value_range() {
        let options = ChartOptions {
            kind: ChartKind::Absolute,
            ..ChartOptions::default()
        };
        let svg = render_chart(&sample_history(), &options);
        assert!(svg.contains("11000.00"));
        assert!(svg.contains("10000.00"));
    }

    #[test]
    fn two_series_share_axes() {
        let options = ChartOptions {
            kind: ChartKind::Percent,
            series: vec![SeriesKind::Portfolio, SeriesKind::Price],
            title: "Bot vs BTC".into(),
        };
        let svg = render_chart(&sample_history(), &options);
        assert_eq!(svg.matches("<polyline").count(), 2);
        assert!(svg.contains("Asset price"));
    }

    #[test]
    fn title_is_escaped() {
        let options = ChartOptions {
            title: "P&L <live>".into(),
            ..ChartOptions::default()
        };
        let svg = render_chart(&sample_history(), &options);
        assert!(svg.contains("P&amp;L &lt;live&gt;"));
    }

    #[test]
    fn percent_of_series_starts_at_zero() {
        let mut points = vec![(ts(0), 200.0), (ts(1), 250.0), (ts(2), 150.0)];
        to_percent(&mut points);
        assert_eq!(points[0].1, 0.0);
        assert!((points[1].1 - 25.0).abs() < 1e-9);
        assert!((points[2].1 + 25.0).abs() < 1e-9);
    }

    #[test]
    fn parses_kinds_and_series() {
        assert_eq!("absolute".parse(), Ok(ChartKind::Absolute));
        assert_eq!("PCT".parse(), Ok(ChartKind::Percent));
        assert_eq!("price".parse(), Ok(SeriesKind::Price));
        assert!("candles".parse::<SeriesKind>().is_err());
    }
}
