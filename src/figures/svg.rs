use super::Bar;
use std::fmt::Write;

const WIDTH: f64 = 480.0;
const HEIGHT: f64 = 260.0;
const MARGIN_LEFT: f64 = 52.0;
const MARGIN_RIGHT: f64 = 16.0;
const MARGIN_TOP: f64 = 34.0;
const MARGIN_BOTTOM: f64 = 60.0;
const BAR_FILL: &str = "#4c78a8";

/// Vertical bar chart on a fixed 480x260 canvas. Geometry depends only on `bars`.
pub(super) fn bar_chart(title: &str, x_label: &str, y_label: &str, bars: &[Bar]) -> String {
    let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let baseline = MARGIN_TOP + plot_h;
    let max = bars.iter().map(|b| b.value).fold(0.0_f64, f64::max);
    let scale = if max > 0.0 { plot_h / max } else { 0.0 };
    let slot = plot_w / bars.len().max(1) as f64;
    let bar_w = slot * 0.7;

    let mut out = String::new();
    // write! into a String cannot fail
    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif">"#,
        w = WIDTH,
        h = HEIGHT
    );
    let _ = write!(
        out,
        r#"<text x="{:.1}" y="20" font-size="13" text-anchor="middle">{}</text>"#,
        WIDTH / 2.0,
        escape(title)
    );
    let _ = write!(
        out,
        r##"<line x1="{l:.1}" y1="{t:.1}" x2="{l:.1}" y2="{b:.1}" stroke="#333"/><line x1="{l:.1}" y1="{b:.1}" x2="{r:.1}" y2="{b:.1}" stroke="#333"/>"##,
        l = MARGIN_LEFT,
        t = MARGIN_TOP,
        b = baseline,
        r = WIDTH - MARGIN_RIGHT
    );
    let _ = write!(
        out,
        r#"<text x="{:.1}" y="{:.1}" font-size="9" text-anchor="end">{}</text>"#,
        MARGIN_LEFT - 4.0,
        MARGIN_TOP + 4.0,
        format_value(max)
    );

    for (i, bar) in bars.iter().enumerate() {
        let h = bar.value * scale;
        let x = MARGIN_LEFT + i as f64 * slot + (slot - bar_w) / 2.0;
        let y = baseline - h;
        let cx = x + bar_w / 2.0;
        let _ = write!(
            out,
            r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"><title>{}: {}</title></rect>"#,
            x,
            y,
            bar_w,
            h,
            BAR_FILL,
            escape(&bar.label),
            format_value(bar.value)
        );
        let _ = write!(
            out,
            r#"<text x="{cx:.1}" y="{ly:.1}" font-size="9" text-anchor="end" transform="rotate(-35 {cx:.1} {ly:.1})">{label}</text>"#,
            cx = cx,
            ly = baseline + 12.0,
            label = escape(&bar.label)
        );
    }

    let _ = write!(
        out,
        r#"<text x="{:.1}" y="{:.1}" font-size="10" text-anchor="middle">{}</text>"#,
        MARGIN_LEFT + plot_w / 2.0,
        HEIGHT - 6.0,
        escape(x_label)
    );
    let _ = write!(
        out,
        r#"<text x="14" y="{y:.1}" font-size="10" text-anchor="middle" transform="rotate(-90 14 {y:.1})">{}</text>"#,
        escape(y_label),
        y = MARGIN_TOP + plot_h / 2.0
    );
    out.push_str("</svg>");
    out
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
