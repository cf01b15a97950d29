/// LAS/LAZ point cloud input
use indexmap::IndexMap;
use las::Reader;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

use crate::error::{PreprocessError, Result};
use crate::point_cloud::PointCloud;
use crate::progress::progress_bar;

/// Create LAS file reader for point cloud access.
/// Handles both .las and .laz compressed formats.
pub fn create_reader(file_path: &Path) -> Result<Reader> {
    let file = File::open(file_path).map_err(|e| PreprocessError::io(file_path, e))?;
    let buf_reader = BufReader::new(file);
    Ok(Reader::new(buf_reader)?)
}

/// Load every point with its per-point attributes as variables:
/// `intensity`, `classification` and `return_number` always, plus
/// `red`/`green`/`blue` and `gps_time` when the point format carries them.
pub fn read_las(path: &Path) -> Result<PointCloud> {
    let mut reader = create_reader(path)?;
    let header = reader.header().clone();
    let format = header.point_format();
    let total_points = header.number_of_points() as usize;

    info!(
        path = %path.display(),
        version = format!("{}.{}", header.version().major, header.version().minor),
        points = total_points,
        point_format = format.to_u8().unwrap_or_default(),
        "LAS/LAZ file opened"
    );

    let mut names = vec!["intensity", "classification", "return_number"];
    if format.has_color {
        names.extend(["red", "green", "blue"]);
    }
    if format.has_gps_time {
        names.push("gps_time");
    }

    let mut x = Vec::with_capacity(total_points);
    let mut y = Vec::with_capacity(total_points);
    let mut z = Vec::with_capacity(total_points);
    let mut attributes: IndexMap<&str, Vec<f64>> = names
        .iter()
        .map(|&name| (name, Vec::with_capacity(total_points)))
        .collect();

    let pb = progress_bar(total_points as u64, "Loading points");
    for (idx, point_result) in reader.points().enumerate() {
        let point = point_result?;
        x.push(point.x);
        y.push(point.y);
        z.push(point.z);

        attributes["intensity"].push(f64::from(point.intensity));
        attributes["classification"].push(f64::from(u8::from(point.classification)));
        attributes["return_number"].push(f64::from(point.return_number));
        if format.has_color {
            let (red, green, blue) = point
                .color
                .map(|c| (c.red, c.green, c.blue))
                .unwrap_or((0, 0, 0));
            attributes["red"].push(f64::from(red));
            attributes["green"].push(f64::from(green));
            attributes["blue"].push(f64::from(blue));
        }
        if format.has_gps_time {
            attributes["gps_time"].push(point.gps_time.unwrap_or(f64::NAN));
        }

        if idx % 50_000 == 0 {
            pb.set_position(idx as u64);
        }
    }
    pb.finish_with_message("Points loaded");

    let mut columns = vec![
        ("x".to_string(), x),
        ("y".to_string(), y),
        ("z".to_string(), z),
    ];
    columns.extend(
        attributes
            .into_iter()
            .map(|(name, values)| (name.to_string(), values)),
    );
    PointCloud::from_columns(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use las::point::{Classification, Format};
    use las::{Builder, Color, Point, Writer};

    fn write_las(path: &Path, format: u8, points: Vec<Point>) {
        let mut builder = Builder::from((1, 2));
        builder.point_format = Format::new(format).unwrap();
        let header = builder.into_header().unwrap();
        let mut writer = Writer::from_path(path, header).unwrap();
        for point in points {
            writer.write_point(point).unwrap();
        }
        writer.close().unwrap();
    }

    fn point(x: f64, intensity: u16) -> Point {
        Point {
            x,
            y: 2.0 * x,
            z: -x,
            intensity,
            return_number: 1,
            number_of_returns: 1,
            classification: Classification::Ground,
            ..Default::default()
        }
    }

    #[test]
    fn colour_and_gps_time_become_variables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.las");
        let points = (0..3)
            .map(|i| Point {
                gps_time: Some(100.0 + i as f64),
                color: Some(Color::new(10 * i as u16, 20, 30)),
                ..point(i as f64, 500 + i as u16)
            })
            .collect();
        write_las(&path, 3, points);

        let cloud = crate::read_point_cloud(&path).unwrap();
        assert_eq!(cloud.len(), 3);
        assert_eq!(
            cloud.variable_names(),
            vec![
                "intensity",
                "classification",
                "return_number",
                "red",
                "green",
                "blue",
                "gps_time"
            ]
        );
        assert_eq!(cloud.variable("intensity"), Some(&[500.0, 501.0, 502.0][..]));
        assert_eq!(cloud.variable("classification"), Some(&[2.0, 2.0, 2.0][..]));
        assert_eq!(cloud.variable("return_number"), Some(&[1.0, 1.0, 1.0][..]));
        assert_eq!(cloud.variable("red"), Some(&[0.0, 10.0, 20.0][..]));
        assert_eq!(cloud.variable("blue"), Some(&[30.0, 30.0, 30.0][..]));
        assert_eq!(cloud.variable("gps_time"), Some(&[100.0, 101.0, 102.0][..]));

        let ys = cloud.coordinates(crate::axis::Axis::Y);
        assert!((ys[2] - 4.0).abs() < 1e-6);
    }

    #[test]
    fn plain_format_carries_only_base_attributes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.las");
        write_las(&path, 0, vec![point(0.5, 7), point(1.5, 9)]);

        let cloud = read_las(&path).unwrap();
        assert_eq!(
            cloud.variable_names(),
            vec!["intensity", "classification", "return_number"]
        );
        assert_eq!(cloud.variable("intensity"), Some(&[7.0, 9.0][..]));
        assert!((cloud.coordinates(crate::axis::Axis::Z)[1] + 1.5).abs() < 1e-6);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_las(&dir.path().join("absent.las")).unwrap_err();
        assert!(matches!(err, PreprocessError::Io { .. }));
    }
}
