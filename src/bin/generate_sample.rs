use std::path::PathBuf;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

use quakewatch::config::FeedConfig;
use quakewatch::data::model::TimeRange;
use quakewatch::data::time::now_ms;

/// (local description, region, longitude, latitude)
const SITES: [(&str, &str, f64, f64); 8] = [
    ("8 km NW of The Geysers", "CA", -122.8, 38.8),
    ("12 km SSE of Ridgecrest", "CA", -117.6, 35.5),
    ("45 km SW of Lata", "Solomon Islands", 165.5, -11.0),
    ("10 km NE of Tokyo", "Japan", 139.8, 35.8),
    ("34 km W of Anchorage", "Alaska", -150.5, 61.2),
    ("5 km S of Volcano", "Hawaii", -155.2, 19.4),
    ("60 km N of Valparaíso", "Chile", -71.6, -32.5),
    ("Off the coast of", "Northern Sumatra, Indonesia", 95.9, 3.2),
];

/// Gutenberg-Richter-ish magnitudes: mostly small, occasionally large.
fn sample_magnitude(rng: &mut StdRng) -> f64 {
    let u: f64 = rng.random::<f64>().max(1e-9);
    let m = -0.5 + (-u.ln()) * 1.1;
    (m.min(8.5) * 10.0).round() / 10.0
}

fn feature(rng: &mut StdRng, seq: usize, now: i64, span_ms: i64) -> Value {
    let (local, region, lon, lat) = SITES[rng.random_range(0..SITES.len())];
    let mag = sample_magnitude(rng);
    let time = now - rng.random_range(0..span_ms);
    let lon = lon + rng.random_range(-0.5..0.5);
    let lat = lat + rng.random_range(-0.5..0.5);
    let depth = rng.random_range(-2.0..120.0_f64);
    let place = format!("{local}, {region}");
    let id = format!("qw{seq:07}");

    json!({
        "type": "Feature",
        "id": id,
        "properties": {
            "mag": mag,
            "place": place,
            "time": time,
            "title": format!("M {mag:.1} - {place}"),
            "url": format!("https://earthquake.usgs.gov/earthquakes/eventpage/{id}"),
        },
        "geometry": { "type": "Point", "coordinates": [lon, lat, depth] }
    })
}

fn main() -> Result<()> {
    env_logger::init();

    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_feeds"));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = StdRng::seed_from_u64(42);
    let now = now_ms();
    let mut seq = 0usize;

    for range in TimeRange::ALL {
        // Roughly the density of the real "all" feeds.
        let count = match range {
            TimeRange::Hour => 12,
            TimeRange::Day => 250,
            TimeRange::Week => 1_500,
            TimeRange::Month => 6_000,
        };
        let features: Vec<Value> = (0..count)
            .map(|_| {
                seq += 1;
                feature(&mut rng, seq, now, range.span_ms())
            })
            .collect();

        let doc = json!({
            "type": "FeatureCollection",
            "metadata": { "generated": now, "title": format!("QuakeWatch sample, {}", range.label()) },
            "features": features,
        });

        let path = out_dir.join(FeedConfig::file_name(range));
        let text = serde_json::to_string(&doc).context("serialising feed")?;
        std::fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
        log::info!("Wrote {count} events to {}", path.display());
        println!("Wrote {count} events to {}", path.display());
    }

    println!(
        "Run with {}={} to use these feeds",
        quakewatch::config::ENV_FEED_DIR,
        out_dir.display()
    );
    Ok(())
}
