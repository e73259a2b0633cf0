use crate::map::{Lod, MapRenderer};
use anyhow::{Context, Result};
use geojson::{GeoJson, Geometry, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Load all available Natural Earth GeoJSON data into the map renderer.
/// Missing files are skipped; unreadable ones are logged and skipped.
pub fn load_all_geojson(renderer: &mut MapRenderer, data_dir: &Path) -> Result<()> {
    let coastline_files = [
        ("ne_110m_coastline.json", Lod::Low),
        ("ne_50m_coastline.json", Lod::Medium),
        ("ne_10m_coastline.json", Lod::High),
    ];
    for (filename, lod) in coastline_files {
        load_if_present(data_dir, filename, |gj| {
            process_geojson_lines(gj, |line| renderer.add_coastline(line, lod))
        });
    }

    let border_files = [
        ("ne_50m_borders.json", Lod::Medium),
        ("ne_10m_borders.json", Lod::High),
    ];
    for (filename, lod) in border_files {
        load_if_present(data_dir, filename, |gj| {
            process_geojson_lines(gj, |line| renderer.add_border(line, lod))
        });
    }

    load_if_present(data_dir, "ne_10m_populated_places.json", |gj| {
        process_places(gj, renderer)
    });

    Ok(())
}

fn load_if_present<F>(data_dir: &Path, filename: &str, apply: F)
where
    F: FnOnce(&GeoJson),
{
    let path = data_dir.join(filename);
    if !path.exists() {
        return;
    }
    match read_geojson(&path) {
        Ok(gj) => {
            debug!("loaded {}", path.display());
            apply(&gj);
        }
        Err(e) => warn!("failed to load {filename}: {e:#}"),
    }
}

fn read_geojson(path: &Path) -> Result<GeoJson> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let geojson: GeoJson = content
        .parse()
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(geojson)
}

/// Named points with a population become map labels
fn process_places(geojson: &GeoJson, renderer: &mut MapRenderer) {
    let GeoJson::FeatureCollection(fc) = geojson else {
        return;
    };
    for feature in &fc.features {
        let props = feature.properties.as_ref();

        let name = props
            .and_then(|p| p.get("name"))
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown");

        let population = props
            .and_then(|p| p.get("pop_max").or_else(|| p.get("pop_min")))
            .and_then(|v| v.as_f64())
            .map(|v| v as u64)
            .unwrap_or(0);

        if let Some(Value::Point(coords)) = feature.geometry.as_ref().map(|g| &g.value) {
            if coords.len() >= 2 {
                renderer.add_place(coords[0], coords[1], name, population);
            }
        }
    }
}

/// Process GeoJSON and extract line features
fn process_geojson_lines<F>(geojson: &GeoJson, mut add_line: F)
where
    F: FnMut(Vec<(f64, f64)>),
{
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(ref geometry) = feature.geometry {
                    process_geometry_lines(geometry, &mut add_line);
                }
            }
        }
        GeoJson::Feature(f) => {
            if let Some(ref geometry) = f.geometry {
                process_geometry_lines(geometry, &mut add_line);
            }
        }
        GeoJson::Geometry(geometry) => process_geometry_lines(geometry, &mut add_line),
    }
}

fn to_line(coords: &[Vec<f64>]) -> Vec<(f64, f64)> {
    coords.iter().map(|c| (c[0], c[1])).collect()
}

fn process_geometry_lines<F>(geometry: &Geometry, add_line: &mut F)
where
    F: FnMut(Vec<(f64, f64)>),
{
    match &geometry.value {
        Value::LineString(coords) => add_line(to_line(coords)),
        Value::MultiLineString(lines) => lines.iter().for_each(|l| add_line(to_line(l))),
        // Exterior rings only
        Value::Polygon(rings) => {
            if let Some(exterior) = rings.first() {
                add_line(to_line(exterior));
            }
        }
        Value::MultiPolygon(polygons) => {
            for exterior in polygons.iter().filter_map(|rings| rings.first()) {
                add_line(to_line(exterior));
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                process_geometry_lines(g, add_line);
            }
        }
        _ => {}
    }
}

/// Coarse outline of the theatre for when no data file is available
pub fn generate_theatre_outline(renderer: &mut MapRenderer) {
    // Anatolia south coast, Levant, Nile delta
    renderer.add_coastline(
        vec![
            (27.3, 36.9), (30.6, 36.8), (32.5, 36.1), (34.0, 36.3), (35.5, 36.6),
            (36.2, 36.6), (35.8, 35.5), (35.9, 34.9), (35.8, 34.4), (35.5, 33.9),
            (35.2, 33.3), (35.0, 32.8), (34.8, 32.1), (34.6, 31.8), (34.4, 31.5),
            (33.8, 31.1), (32.3, 31.3), (31.0, 31.6), (29.9, 31.2), (25.0, 31.6),
        ],
        Lod::Low,
    );

    // Gulf of Suez, Sinai, Gulf of Aqaba, Arabian Red Sea coast around to the Gulf
    renderer.add_coastline(
        vec![
            (32.6, 30.0), (33.5, 28.2), (34.3, 27.7), (34.5, 28.1), (34.9, 29.5),
            (35.0, 29.5), (34.8, 28.0), (36.5, 26.0), (38.0, 24.0), (39.2, 21.5),
            (41.0, 19.0), (42.6, 16.5), (43.2, 13.3), (43.5, 12.6), (45.0, 12.8),
            (48.0, 14.0), (52.2, 15.6), (55.0, 17.0), (57.8, 19.0), (59.8, 22.5),
            (58.5, 23.6), (56.3, 26.2), (55.3, 25.3), (52.0, 24.0), (51.6, 25.3),
            (50.2, 26.3), (48.5, 28.5), (48.0, 30.0),
        ],
        Lod::Low,
    );

    // Egyptian and Sudanese Red Sea coast
    renderer.add_coastline(
        vec![(32.6, 30.0), (33.6, 27.2), (35.5, 23.9), (37.2, 21.0), (37.3, 19.6)],
        Lod::Low,
    );

    // Iranian Gulf coast
    renderer.add_coastline(
        vec![
            (48.0, 30.0), (49.0, 30.2), (50.8, 28.9), (54.0, 26.7), (56.3, 27.2),
            (57.8, 25.7), (61.6, 25.2),
        ],
        Lod::Low,
    );

    // Caspian south shore
    renderer.add_coastline(
        vec![(49.0, 38.4), (50.5, 37.0), (52.5, 36.7), (54.0, 37.0), (54.0, 38.5)],
        Lod::Low,
    );

    let places = [
        (34.78, 32.08, "Tel Aviv", 4_200_000),
        (35.21, 31.77, "Jerusalem", 1_000_000),
        (34.99, 32.79, "Haifa", 1_100_000),
        (34.79, 31.25, "Beersheba", 210_000),
        (34.95, 29.56, "Eilat", 52_000),
        (35.50, 33.89, "Beirut", 2_400_000),
        (36.29, 33.51, "Damascus", 2_500_000),
        (35.93, 31.95, "Amman", 4_000_000),
        (31.24, 30.04, "Cairo", 21_000_000),
        (44.36, 33.31, "Baghdad", 7_500_000),
        (51.39, 35.69, "Tehran", 9_000_000),
        (46.68, 24.71, "Riyadh", 7_600_000),
        (44.21, 15.35, "Sanaa", 3_200_000),
    ];
    for (lon, lat, name, population) in places {
        renderer.add_place(lon, lat, name, population);
    }
}
