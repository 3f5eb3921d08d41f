//! 轮廓表面积
//!
//! 每个层面的轮廓视为厚度等于层间距的平板：侧面积为周长 × 层厚，
//! 再加上首末层面的端面面积。层厚取相邻层面z间距的中位数。结果单位为 cm²。

use crate::collaborators::SurfaceAreaCalculator;
use rtx_core::{Point3, Result, RtError};
use rtx_dicom::ContourPlane;

/// mm² -> cm²
const MM2_PER_CM2: f64 = 100.0;

/// 基于平面轮廓的表面积计算
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanarSurfaceArea;

impl PlanarSurfaceArea {
    pub fn new() -> Self {
        Self
    }
}

/// 多边形面积（鞋带公式，只用x、y）
pub fn polygon_area(points: &[Point3]) -> f64 {
    let n = points.len();
    let twice: f64 = (0..n)
        .map(|i| {
            let (a, b) = (points[i], points[(i + 1) % n]);
            a[0] * b[1] - b[0] * a[1]
        })
        .sum();
    twice.abs() / 2.0
}

/// 闭合多边形周长
pub fn polygon_perimeter(points: &[Point3]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let (a, b) = (points[i], points[(i + 1) % n]);
            ((b[0] - a[0]).powi(2) + (b[1] - a[1]).powi(2)).sqrt()
        })
        .sum()
}

/// 相邻层面间距的中位数，单层面时为0
fn slice_thickness(planes: &[ContourPlane]) -> f64 {
    let mut gaps: Vec<f64> = planes
        .windows(2)
        .map(|w| (w[1].z - w[0].z).abs())
        .collect();
    if gaps.is_empty() {
        return 0.0;
    }
    gaps.sort_by(|a, b| a.total_cmp(b));
    let mid = gaps.len() / 2;
    if gaps.len() % 2 == 0 {
        (gaps[mid - 1] + gaps[mid]) / 2.0
    } else {
        gaps[mid]
    }
}

impl SurfaceAreaCalculator for PlanarSurfaceArea {
    fn surface_area(&self, planes: &[ContourPlane]) -> Result<f64> {
        let (Some(first), Some(last)) = (planes.first(), planes.last()) else {
            return Err(RtError::Geometry("结构没有轮廓层面".to_string()));
        };

        for plane in planes {
            if let Some(contour) = plane.contours.iter().find(|c| c.points.len() < 3) {
                return Err(RtError::Geometry(format!(
                    "z={} 处的轮廓只有 {} 个点",
                    plane.z,
                    contour.points.len()
                )));
            }
        }

        let thickness = slice_thickness(planes);
        let lateral: f64 = planes
            .iter()
            .flat_map(|plane| &plane.contours)
            .map(|contour| polygon_perimeter(&contour.points) * thickness)
            .sum();
        let cap = |plane: &ContourPlane| -> f64 {
            plane.contours.iter().map(|c| polygon_area(&c.points)).sum()
        };

        Ok((lateral + cap(first) + cap(last)) / MM2_PER_CM2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtx_dicom::Contour;

    fn square(z: f64, side: f64) -> ContourPlane {
        ContourPlane {
            z,
            contours: vec![Contour {
                geometric_type: Some("CLOSED_PLANAR".to_string()),
                points: vec![[0.0, 0.0, z], [side, 0.0, z], [side, side, z], [0.0, side, z]],
            }],
        }
    }

    #[test]
    fn test_polygon_metrics() {
        let plane = square(0.0, 10.0);
        assert_eq!(polygon_area(&plane.contours[0].points), 100.0);
        assert_eq!(polygon_perimeter(&plane.contours[0].points), 40.0);
    }

    #[test]
    fn test_stacked_squares() {
        let planes = vec![square(0.0, 10.0), square(10.0, 10.0)];
        // 侧面 2 × 40 × 10 + 端面 2 × 100 = 1000 mm²
        let area = PlanarSurfaceArea::new().surface_area(&planes).unwrap();
        assert!((area - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_median_slice_thickness() {
        let planes = vec![square(0.0, 1.0), square(3.0, 1.0), square(6.0, 1.0), square(15.0, 1.0)];
        assert_eq!(slice_thickness(&planes), 3.0);
    }

    #[test]
    fn test_degenerate_inputs_fail() {
        let calc = PlanarSurfaceArea::new();
        assert!(matches!(calc.surface_area(&[]), Err(RtError::Geometry(_))));

        let line = ContourPlane {
            z: 0.0,
            contours: vec![Contour {
                geometric_type: None,
                points: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
            }],
        };
        assert!(matches!(calc.surface_area(&[line]), Err(RtError::Geometry(_))));
    }
}
