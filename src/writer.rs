//! GPX 1.1 export of recorded samples.
//!
//! The document is assembled as text, one element per line, with a single
//! track holding a single segment. The only non-deterministic field is the
//! `<metadata><time>` stamp, which comes from a [`Clock`].

use std::fmt::Write as _;

use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, warn};
use quick_xml::escape::escape;

use crate::clock::{Clock, SystemClock};
use crate::gpx_types::SampleForExport;
use crate::options::ExportOptions;

const GPX_NAMESPACE: &str = "http://www.topografix.com/GPX/1/1";
const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
const GPX_SCHEMA_LOCATION: &str =
    "http://www.topografix.com/GPX/1/1 http://www.topografix.com/GPX/1/1/gpx.xsd";

/// Generate a GPX document stamped with the current time.
///
/// `name` defaults to "Ride".
pub fn generate_gpx(samples: &[SampleForExport], name: Option<&str>) -> String {
    let opts = match name {
        Some(name) => ExportOptions::named(name),
        None => ExportOptions::default(),
    };
    generate_gpx_with(samples, &opts, &SystemClock)
}

/// Generate a GPX document with explicit options and time source.
pub fn generate_gpx_with(
    samples: &[SampleForExport],
    opts: &ExportOptions,
    clock: &dyn Clock,
) -> String {
    let name = escape(opts.name.as_str());
    let mut gpx = String::new();

    gpx.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    gpx.push('\n');
    let _ = writeln!(
        gpx,
        r#"<gpx version="1.1" creator="{}" xmlns="{GPX_NAMESPACE}" xmlns:xsi="{XSI_NAMESPACE}" xsi:schemaLocation="{GPX_SCHEMA_LOCATION}">"#,
        escape(opts.creator.as_str())
    );

    gpx.push_str("  <metadata>\n");
    let _ = writeln!(gpx, "    <name>{name}</name>");
    let _ = writeln!(gpx, "    <time>{}</time>", iso_timestamp(clock.now()));
    gpx.push_str("  </metadata>\n");

    gpx.push_str("  <trk>\n");
    let _ = writeln!(gpx, "    <name>{name}</name>");
    gpx.push_str("    <trkseg>\n");

    for sample in samples {
        write_trkpt(&mut gpx, sample);
    }

    gpx.push_str("    </trkseg>\n");
    gpx.push_str("  </trk>\n");
    gpx.push_str("</gpx>\n");

    debug!(
        "generated GPX '{}' with {} trackpoints ({} bytes)",
        opts.name,
        samples.len(),
        gpx.len()
    );
    gpx
}

fn write_trkpt(gpx: &mut String, sample: &SampleForExport) {
    let _ = writeln!(
        gpx,
        r#"      <trkpt lat="{:.6}" lon="{:.6}">"#,
        sample.latitude, sample.longitude
    );

    // zero altitude counts as "no altitude"
    if let Some(alt) = sample.altitude.filter(|a| *a != 0.0 && !a.is_nan()) {
        let _ = writeln!(gpx, "        <ele>{alt:.1}</ele>");
    }

    match DateTime::from_timestamp_millis(sample.timestamp_ms) {
        Some(time) => {
            let _ = writeln!(gpx, "        <time>{}</time>", iso_timestamp(time));
        }
        None => warn!(
            "timestamp {} ms out of range, omitting <time>",
            sample.timestamp_ms
        ),
    }

    gpx.push_str("      </trkpt>\n");
}

/// `YYYY-MM-DDTHH:MM:SS.sssZ`
fn iso_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    fn clock() -> FixedClock {
        // 2024-03-01T08:30:00.000Z
        FixedClock::from_millis(1_709_281_800_000).unwrap()
    }

    fn sample(lat: f64, lon: f64, alt: Option<f64>, ts: i64) -> SampleForExport {
        SampleForExport {
            latitude: lat,
            longitude: lon,
            altitude: alt,
            timestamp_ms: ts,
        }
    }

    #[test]
    fn test_iso_timestamp() {
        let time = DateTime::from_timestamp_millis(1_709_281_800_123).unwrap();
        assert_eq!(iso_timestamp(time), "2024-03-01T08:30:00.123Z");
        let epoch = DateTime::from_timestamp_millis(0).unwrap();
        assert_eq!(iso_timestamp(epoch), "1970-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_header_and_metadata() {
        let gpx = generate_gpx_with(&[], &ExportOptions::default(), &clock());
        assert!(gpx.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<gpx version=\"1.1\""));
        assert!(gpx.contains(r#"creator="gpx-route-wasm""#));
        assert!(gpx.contains(r#"xmlns="http://www.topografix.com/GPX/1/1""#));
        assert!(gpx.contains(r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance""#));
        assert!(gpx.contains(
            r#"xsi:schemaLocation="http://www.topografix.com/GPX/1/1 http://www.topografix.com/GPX/1/1/gpx.xsd""#
        ));
        assert!(gpx.contains("  <metadata>\n    <name>Ride</name>\n    <time>2024-03-01T08:30:00.000Z</time>\n  </metadata>\n"));
        assert!(gpx.contains("  <trk>\n    <name>Ride</name>\n    <trkseg>\n    </trkseg>\n  </trk>\n</gpx>\n"));
    }

    #[test]
    fn test_default_name() {
        let gpx = generate_gpx(&[], None);
        assert_eq!(gpx.matches("<name>Ride</name>").count(), 2);
    }

    #[test]
    fn test_name_escaped() {
        let gpx = generate_gpx(&[], Some("A & B <C>"));
        assert_eq!(gpx.matches("<name>A &amp; B &lt;C&gt;</name>").count(), 2);

        let quoted = generate_gpx(&[], Some(r#"Tom's "big" ride"#));
        assert!(quoted.contains("<name>Tom&apos;s &quot;big&quot; ride</name>"));
    }

    #[test]
    fn test_already_escaped_name_is_escaped_again() {
        let gpx = generate_gpx(&[], Some("&lt;"));
        assert!(gpx.contains("<name>&amp;lt;</name>"));
    }

    #[test]
    fn test_trkpt_formatting() {
        let samples = [sample(47.123456789, -8.5, Some(432.26), 1_709_281_800_500)];
        let gpx = generate_gpx_with(&samples, &ExportOptions::default(), &clock());
        assert!(gpx.contains(
            "      <trkpt lat=\"47.123457\" lon=\"-8.500000\">\n        <ele>432.3</ele>\n        <time>2024-03-01T08:30:00.500Z</time>\n      </trkpt>\n"
        ));
    }

    #[test]
    fn test_zero_and_missing_altitude_omitted() {
        let samples = [
            sample(1.0, 2.0, Some(0.0), 0),
            sample(1.0, 2.0, None, 0),
            sample(1.0, 2.0, Some(-3.0), 0),
        ];
        let gpx = generate_gpx_with(&samples, &ExportOptions::default(), &clock());
        assert_eq!(gpx.matches("<trkpt ").count(), 3);
        assert_eq!(gpx.matches("<ele>").count(), 1);
        assert!(gpx.contains("<ele>-3.0</ele>"));
    }

    #[test]
    fn test_out_of_range_timestamp_omits_time() {
        let samples = [sample(1.0, 2.0, None, i64::MAX)];
        let gpx = generate_gpx_with(&samples, &ExportOptions::default(), &clock());
        assert_eq!(gpx.matches("<trkpt ").count(), 1);
        // only the metadata stamp remains
        assert_eq!(gpx.matches("<time>").count(), 1);
    }

    #[test]
    fn test_custom_creator() {
        let opts = ExportOptions {
            name: "Loop".to_string(),
            creator: "My \"App\"".to_string(),
        };
        let gpx = generate_gpx_with(&[], &opts, &clock());
        assert!(gpx.contains(r#"creator="My &quot;App&quot;""#));
        assert!(gpx.contains("<name>Loop</name>"));
    }

    #[test]
    fn test_sample_order_preserved() {
        let samples = [
            sample(1.0, 1.0, None, 1_000),
            sample(2.0, 2.0, None, 2_000),
            sample(3.0, 3.0, None, 3_000),
        ];
        let gpx = generate_gpx_with(&samples, &ExportOptions::default(), &clock());
        let first = gpx.find(r#"lat="1.000000""#).unwrap();
        let second = gpx.find(r#"lat="2.000000""#).unwrap();
        let third = gpx.find(r#"lat="3.000000""#).unwrap();
        assert!(first < second && second < third);
    }
}
