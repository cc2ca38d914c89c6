//! Human-readable volume strings (`$2.1M`, `$15.2B`, `$980`) and price labels.
//!
//! Providers report raw 24h volume; readings carry it pre-formatted. The
//! aggregator parses the strings back, sums them and formats the total.

/// Format a raw volume with a `$` prefix and a K/M/B suffix, one decimal
pub fn format_volume(volume: f64) -> String {
    if !volume.is_finite() || volume < 0.0 {
        return "$0".to_string();
    }

    if volume >= 1e9 {
        format!("${:.1}B", volume / 1e9)
    } else if volume >= 1e6 {
        format!("${:.1}M", volume / 1e6)
    } else if volume >= 1e3 {
        format!("${:.1}K", volume / 1e3)
    } else {
        format!("${:.0}", volume)
    }
}

/// Parse a formatted volume back into a number.
///
/// Suffixes are case-insensitive (`k`, `m`, `b`). Anything unparseable is 0.
pub fn parse_volume(volume: &str) -> f64 {
    let clean = volume.trim().trim_start_matches('$').replace(',', "").to_lowercase();

    let (digits, multiplier) = if let Some(rest) = clean.strip_suffix('b') {
        (rest, 1e9)
    } else if let Some(rest) = clean.strip_suffix('m') {
        (rest, 1e6)
    } else if let Some(rest) = clean.strip_suffix('k') {
        (rest, 1e3)
    } else {
        (clean.as_str(), 1.0)
    };

    digits
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v * multiplier)
        .unwrap_or(0.0)
}

/// Format a price for display: two decimals at or above 1, six below
pub fn format_price(price: f64) -> String {
    if price >= 1.0 {
        format!("${:.2}", price)
    } else {
        format!("${:.6}", price)
    }
}

/// Format a signed percentage change (`+1.25%`, `-0.40%`)
pub fn format_change(change: f64) -> String {
    format!("{:+.2}%", change)
}
