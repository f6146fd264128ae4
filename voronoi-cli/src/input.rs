//! Point-file parsing: UTF-8 text, one site per line, `x,y`; blank lines
//! and `//`-prefixed comments ignored. This lives in the harness, not the
//! core — the core never touches the filesystem.

use std::path::Path;

use anyhow::{bail, Context, Result};
use fortunes::Point;

pub fn read_points_file(path: &Path) -> Result<Vec<Point>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading point file {}", path.display()))?;
    parse_points(&text)
}

pub fn parse_points(text: &str) -> Result<Vec<Point>> {
    let mut points = Vec::new();
    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        points.push(parse_line(line).with_context(|| format!("line {}: {raw:?}", lineno + 1))?);
    }
    Ok(points)
}

fn parse_line(line: &str) -> Result<Point> {
    let Some((x, y)) = line.split_once(',') else {
        bail!("expected \"x,y\", got {line:?}");
    };
    let x: f64 = x.trim().parse().with_context(|| format!("bad x coordinate {x:?}"))?;
    let y: f64 = y.trim().parse().with_context(|| format!("bad y coordinate {y:?}"))?;
    Ok(Point::from_xy(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_lines_skipping_blanks_and_comments() {
        let text = "// a header comment\n0,0\n\n1.5, -2.25\n// trailing\n";
        let points = parse_points(text).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0], Point::from_xy(0.0, 0.0));
        assert_eq!(points[1], Point::from_xy(1.5, -2.25));
    }

    #[test]
    fn rejects_malformed_lines() {
        let err = parse_points("1,2\nnot-a-point\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn reads_points_from_a_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sites.txt");
        std::fs::write(&path, "0,0\n1,0\n0,1\n").unwrap();
        let points = read_points_file(&path).unwrap();
        assert_eq!(points.len(), 3);
    }
}
