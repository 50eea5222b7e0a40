//! GPX file generation from location samples.
//!
//! Writes GPX 1.1 XML the workout library loader reads back: one `<trk>`
//! per recorded route chunk.

use time::format_description::well_known::Rfc3339;
use workout_map::models::LocationSample;

/// Generates a GPX 1.1 XML document from route chunks.
pub fn generate_gpx(routes: &[Vec<LocationSample>], workout_name: &str) -> Vec<u8> {
    let mut gpx = String::new();

    gpx.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    gpx.push('\n');
    gpx.push_str(r#"<gpx version="1.1" creator="workout-map-test-data""#);
    gpx.push_str(r#" xmlns="http://www.topografix.com/GPX/1/1""#);
    gpx.push_str(r#" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance""#);
    gpx.push_str(r#" xsi:schemaLocation="http://www.topografix.com/GPX/1/1 http://www.topografix.com/GPX/1/1/gpx.xsd">"#);
    gpx.push('\n');

    gpx.push_str("  <metadata>\n");
    gpx.push_str(&format!("    <name>{}</name>\n", escape_xml(workout_name)));
    gpx.push_str("  </metadata>\n");

    for (index, route) in routes.iter().enumerate() {
        gpx.push_str("  <trk>\n");
        gpx.push_str(&format!(
            "    <name>{} ({})</name>\n",
            escape_xml(workout_name),
            index + 1
        ));
        gpx.push_str("    <trkseg>\n");

        for sample in route {
            gpx.push_str(&format!(
                r#"      <trkpt lat="{:.7}" lon="{:.7}">"#,
                sample.latitude, sample.longitude
            ));
            gpx.push('\n');
            let formatted = sample.timestamp.format(&Rfc3339).unwrap_or_default();
            gpx.push_str(&format!("        <time>{formatted}</time>\n"));
            gpx.push_str("      </trkpt>\n");
        }

        gpx.push_str("    </trkseg>\n");
        gpx.push_str("  </trk>\n");
    }

    gpx.push_str("</gpx>\n");

    gpx.into_bytes()
}

/// Escapes XML special characters in a string.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Duration, OffsetDateTime};
    use workout_map::health::GpxLoader;

    fn sample(lat: f64, secs: i64) -> LocationSample {
        LocationSample::new(
            lat,
            -63.7132,
            OffsetDateTime::UNIX_EPOCH + Duration::days(19_000) + Duration::seconds(secs),
        )
    }

    #[test]
    fn test_generate_gpx_basic() {
        let routes = vec![vec![sample(44.6433, 0), sample(44.6443, 60)]];

        let gpx_str = String::from_utf8(generate_gpx(&routes, "Morning Walk")).unwrap();

        assert!(gpx_str.contains(r#"version="1.1""#));
        assert!(gpx_str.contains("<name>Morning Walk</name>"));
        assert!(gpx_str.contains(r#"lat="44.6433000""#));
        assert!(gpx_str.contains(r#"lon="-63.7132000""#));
        assert_eq!(gpx_str.matches("<time>").count(), 2);
    }

    #[test]
    fn test_generate_gpx_escapes_special_chars() {
        let gpx = generate_gpx(&[vec![sample(44.0, 0)]], "Run & <Ride> \"Mix\"");
        let gpx_str = String::from_utf8(gpx).unwrap();

        assert!(gpx_str.contains("Run &amp; &lt;Ride&gt; &quot;Mix&quot;"));
    }

    #[test]
    fn test_chunks_load_back_as_separate_routes() {
        let routes = vec![
            vec![sample(44.60, 0), sample(44.61, 10)],
            vec![sample(44.62, 20), sample(44.63, 30), sample(44.64, 40)],
        ];

        let loaded = GpxLoader::load_bytes(&generate_gpx(&routes, "Chunked")).unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].len(), 2);
        assert_eq!(loaded[1].len(), 3);
        assert_eq!(loaded[1][2].timestamp, routes[1][2].timestamp);
        assert!((loaded[1][2].latitude - 44.64).abs() < 1e-6);
    }
}
