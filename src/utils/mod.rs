use url::Url;

/// Format seconds the way batch consumers expect (Python `str(float)`):
/// whole values keep one decimal place (`0.0`, `12.0`), other values use the
/// shortest round-trip representation (`0.24`, `4.4`), and magnitudes below
/// `1e-4` or from `1e16` up switch to exponent form (`1e-05`, `1e+16`).
pub fn format_seconds(seconds: f64) -> String {
    if seconds.is_nan() {
        return "nan".to_string();
    }
    if seconds.is_infinite() {
        return if seconds > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let magnitude = seconds.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        return exponent_form(seconds);
    }

    if seconds.fract() == 0.0 {
        format!("{:.1}", seconds)
    } else {
        seconds.to_string()
    }
}

/// `1.5e-7` becomes `1.5e-07`; the exponent is signed and at least two digits
fn exponent_form(value: f64) -> String {
    let formatted = format!("{:e}", value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => formatted,
    }
}

/// Extract a video ID from a YouTube URL, or return the input unchanged.
///
/// Used by the CLI so people can paste links; the result still has to pass
/// video ID validation.
pub fn extract_video_id(input: &str) -> String {
    let input = input.trim();

    let candidate = if input.starts_with("http://") || input.starts_with("https://") {
        input.to_string()
    } else if input.contains("youtube.com/") || input.contains("youtu.be/") {
        format!("https://{}", input)
    } else {
        return input.to_string();
    };

    Url::parse(&candidate)
        .ok()
        .and_then(|url| video_id_from_url(&url))
        .unwrap_or_else(|| input.to_string())
}

fn video_id_from_url(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let host = host.strip_prefix("m.").unwrap_or(host);

    let mut segments = url.path_segments()?;
    match host {
        "youtu.be" => segments.next().filter(|s| !s.is_empty()).map(str::to_string),
        "youtube.com" | "music.youtube.com" => match segments.next()? {
            "watch" => url
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned()),
            "embed" | "shorts" | "live" | "v" => {
                segments.next().filter(|s| !s.is_empty()).map(str::to_string)
            }
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(0.0), "0.0");
        assert_eq!(format_seconds(12.0), "12.0");
        assert_eq!(format_seconds(0.24), "0.24");
        assert_eq!(format_seconds(4.4), "4.4");
        assert_eq!(format_seconds(1.54), "1.54");
        assert_eq!(format_seconds(123.456), "123.456");
        assert_eq!(format_seconds(0.0001), "0.0001");
        assert_eq!(format_seconds(9999999999999998.0), "9999999999999998.0");
    }

    #[test]
    fn test_format_seconds_exponent_form() {
        assert_eq!(format_seconds(1e-5), "1e-05");
        assert_eq!(format_seconds(1.5e-7), "1.5e-07");
        assert_eq!(format_seconds(1e16), "1e+16");
        assert_eq!(format_seconds(2.5e120), "2.5e+120");
        assert_eq!(format_seconds(-3e-10), "-3e-10");
        assert_eq!(format_seconds(f64::INFINITY), "inf");
        assert_eq!(format_seconds(f64::NAN), "nan");
    }

    #[test]
    fn test_extract_video_id_from_urls() {
        assert_eq!(extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"), "dQw4w9WgXcQ");
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ"),
            "dQw4w9WgXcQ"
        );
        assert_eq!(extract_video_id("https://youtu.be/_NuH3D4SN-c?si=VSFea_rMwtaiR8Q7"), "_NuH3D4SN-c");
        assert_eq!(extract_video_id("https://m.youtube.com/watch?v=dQw4w9WgXcQ"), "dQw4w9WgXcQ");
        assert_eq!(extract_video_id("youtube.com/embed/dQw4w9WgXcQ"), "dQw4w9WgXcQ");
        assert_eq!(extract_video_id("https://www.youtube.com/shorts/dQw4w9WgXcQ"), "dQw4w9WgXcQ");
    }

    #[test]
    fn test_extract_video_id_passes_through_other_input() {
        assert_eq!(extract_video_id("dQw4w9WgXcQ"), "dQw4w9WgXcQ");
        assert_eq!(extract_video_id("  dQw4w9WgXcQ  "), "dQw4w9WgXcQ");
        assert_eq!(extract_video_id("short"), "short");
        assert_eq!(extract_video_id("https://example.com/watch?v=dQw4w9WgXcQ"), "https://example.com/watch?v=dQw4w9WgXcQ");
    }
}
