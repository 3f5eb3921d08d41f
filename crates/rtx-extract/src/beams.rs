//! 射束几何归约
//!
//! 将每个射束的控制点序列归约为机架、准直器、治疗床三个轴的
//! 起止角度、旋转方向、总旋转范围与极值，并计算每度MU、每控制点MU等指标。

use crate::plan_summary::fraction_count;
use dicom::core::Tag;
use dicom::object::InMemDicomObject;
use rtx_core::utils::round_to;
use rtx_core::{
    AxisGeometry, BeamRecord, DocumentKind, Point3, Result, RotationDirection, RtError,
    StudyIdentity,
};
use rtx_dicom::{tags, AttributeAccess, DocumentSet};
use tracing::{debug, info};

/// 角度原点变换阈值 (度)
pub const ANGLE_THRESHOLD: f64 = 180.0;

/// 源皮距读数单位换算 (mm -> cm)
const SSD_UNIT_DIVISOR: f64 = 10.0;

/// 将0~360度表示变换为以0为中心的±180度表示
pub fn change_angle_origin(angle: f64, threshold: f64) -> f64 {
    if angle > threshold {
        angle - 360.0
    } else {
        angle
    }
}

/// 合并一个轴上各控制点的旋转方向
///
/// 全部一致时取该方向，否则按首次出现的方向组合为 `CW/CC` 或 `CC/CW`。
pub fn merge_directions(directions: &[RotationDirection]) -> RotationDirection {
    let Some(first) = directions.first() else {
        return RotationDirection::None;
    };
    if directions.iter().all(|d| d == first) {
        return *first;
    }
    match first {
        RotationDirection::CounterClockwise => RotationDirection::CounterThenClockwise,
        _ => RotationDirection::ClockwiseThenCounter,
    }
}

/// 单轴归约：角度为空时按 `[0]` 处理
pub fn reduce_axis(angles: &[f64], directions: &[RotationDirection]) -> AxisGeometry {
    let centered: Vec<f64> = if angles.is_empty() {
        vec![0.0]
    } else {
        angles
            .iter()
            .map(|a| change_angle_origin(*a, ANGLE_THRESHOLD))
            .collect()
    };

    let range: f64 = centered.windows(2).map(|w| (w[1] - w[0]).abs()).sum();

    AxisGeometry {
        start: centered[0],
        end: centered[centered.len() - 1],
        rot_dir: merge_directions(directions),
        range: round_to(range, 1),
        min: centered.iter().copied().fold(f64::INFINITY, f64::min),
        max: centered.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    }
}

/// 单个旋转轴在控制点上的角度与方向字段
#[derive(Debug, Clone, Copy)]
struct AxisTags {
    angle: Tag,
    direction: Tag,
}

const GANTRY: AxisTags = AxisTags {
    angle: tags::GANTRY_ANGLE,
    direction: tags::GANTRY_ROTATION_DIRECTION,
};
const COLLIMATOR: AxisTags = AxisTags {
    angle: tags::BEAM_LIMITING_DEVICE_ANGLE,
    direction: tags::BEAM_LIMITING_DEVICE_ROTATION_DIRECTION,
};
const COUCH: AxisTags = AxisTags {
    angle: tags::PATIENT_SUPPORT_ANGLE,
    direction: tags::PATIENT_SUPPORT_ROTATION_DIRECTION,
};

impl AxisTags {
    fn reduce(&self, control_points: &[InMemDicomObject]) -> AxisGeometry {
        let angles: Vec<f64> = control_points
            .iter()
            .filter_map(|cp| cp.opt_f64(self.angle))
            .collect();
        let directions: Vec<RotationDirection> = control_points
            .iter()
            .filter_map(|cp| cp.opt_str(self.direction))
            .filter_map(|code| RotationDirection::from_code(&code))
            .collect();
        reduce_axis(&angles, &directions)
    }
}

/// 提取全部射束记录，编号从1开始连续
pub fn extract_beams(documents: &DocumentSet) -> Result<Vec<BeamRecord>> {
    let plan = documents.plan();
    let identity = documents.identity();
    let groups = plan.require_items(tags::FRACTION_GROUP_SEQUENCE, "FractionGroupSequence")?;

    let (beams, cp_tag, cp_field) = if plan.has(tags::BEAM_SEQUENCE) {
        (
            plan.items(tags::BEAM_SEQUENCE),
            tags::CONTROL_POINT_SEQUENCE,
            "ControlPointSequence",
        )
    } else {
        (
            plan.items(tags::ION_BEAM_SEQUENCE),
            tags::ION_CONTROL_POINT_SEQUENCE,
            "IonControlPointSequence",
        )
    };

    let mut records = Vec::new();
    for (group_index, group) in groups.iter().enumerate() {
        let referenced = group.items(tags::REFERENCED_BEAM_SEQUENCE);
        let fxs = fraction_count(group);
        let beam_count = group
            .opt_i64(tags::NUMBER_OF_BEAMS)
            .map(|n| n.max(0) as u32)
            .unwrap_or(referenced.len() as u32);

        for reference in referenced {
            let position = records.len();
            let beam = resolve_beam(beams, reference, position)?;
            let control_points = beam.required_items(cp_tag, DocumentKind::Plan, cp_field)?;

            records.push(reduce_beam(
                identity,
                beam,
                reference,
                control_points,
                BeamContext {
                    beam_number: position as u32 + 1,
                    fx_group: group_index as u32 + 1,
                    fxs,
                    fx_grp_beam_count: beam_count,
                },
            ));
        }
    }

    info!("射束表: {} 个射束", records.len());
    Ok(records)
}

/// 按ReferencedBeamNumber匹配BeamNumber，缺少编号时按出现顺序对应
fn resolve_beam<'a>(
    beams: &'a [InMemDicomObject],
    reference: &InMemDicomObject,
    position: usize,
) -> Result<&'a InMemDicomObject> {
    match reference.opt_i64(tags::REFERENCED_BEAM_NUMBER) {
        Some(number) => beams
            .iter()
            .find(|beam| beam.opt_i64(tags::BEAM_NUMBER) == Some(number))
            .or_else(|| {
                debug!("射束编号 {} 未找到，按顺序对应第 {} 个射束", number, position + 1);
                beams.get(position)
            })
            .ok_or_else(|| RtError::InvalidValue {
                document: DocumentKind::Plan,
                field: "ReferencedBeamNumber",
                value: number.to_string(),
            }),
        None => beams
            .get(position)
            .ok_or_else(|| RtError::missing(DocumentKind::Plan, "BeamSequence")),
    }
}

#[derive(Debug, Clone, Copy)]
struct BeamContext {
    beam_number: u32,
    fx_group: u32,
    fxs: u32,
    fx_grp_beam_count: u32,
}

fn reduce_beam(
    identity: &StudyIdentity,
    beam: &InMemDicomObject,
    reference: &InMemDicomObject,
    control_points: &[InMemDicomObject],
    context: BeamContext,
) -> BeamRecord {
    let first_cp = &control_points[0];
    let beam_mu = reference.f64_or(tags::BEAM_METERSET, 0.0);

    let gantry = GANTRY.reduce(control_points);
    let collimator = COLLIMATOR.reduce(control_points);
    let couch = COUCH.reduce(control_points);

    let control_point_count = beam
        .opt_i64(tags::NUMBER_OF_CONTROL_POINTS)
        .filter(|n| *n > 0)
        .map(|n| n as u32)
        .unwrap_or(control_points.len() as u32);

    // 最低标称能量同时作为能量上下限
    let min_energy = control_points
        .iter()
        .filter_map(|cp| cp.opt_f64(tags::NOMINAL_BEAM_ENERGY))
        .reduce(f64::min)
        .map(|e| round_to(e, 2));

    let rotational = [gantry.rot_dir, collimator.rot_dir, couch.rot_dir]
        .iter()
        .any(RotationDirection::is_rotational);

    BeamRecord {
        patient_id: identity.patient_id.clone(),
        study_instance_uid: identity.study_instance_uid.clone(),
        beam_number: context.beam_number,
        beam_name: beam
            .opt_str(tags::BEAM_DESCRIPTION)
            .or_else(|| beam.opt_str(tags::BEAM_NAME)),
        fx_group: context.fx_group,
        fxs: context.fxs,
        fx_grp_beam_count: context.fx_grp_beam_count,
        beam_dose: reference.opt_f64(tags::BEAM_DOSE),
        beam_mu,
        radiation_type: beam.opt_str(tags::RADIATION_TYPE),
        beam_energy_min: min_energy,
        beam_energy_max: min_energy,
        beam_type: beam.opt_str(tags::BEAM_TYPE),
        control_point_count,
        beam_dose_pt: point_of(reference, tags::BEAM_DOSE_SPECIFICATION_POINT),
        isocenter: point_of(first_cp, tags::ISOCENTER_POSITION),
        ssd: source_to_surface_distance(control_points, rotational),
        treatment_machine: beam.opt_str(tags::TREATMENT_MACHINE_NAME),
        scan_mode: beam.opt_str(tags::SCAN_MODE),
        scan_spot_count: scan_spot_count(control_points),
        beam_mu_per_deg: if gantry.range > 0.0 {
            Some(round_to(beam_mu / gantry.range, 2))
        } else {
            None
        },
        beam_mu_per_cp: round_to(beam_mu / control_point_count as f64, 2),
        gantry,
        collimator,
        couch,
    }
}

fn point_of(item: &InMemDicomObject, tag: Tag) -> Option<Point3> {
    match item.opt_f64s(tag)?.as_slice() {
        [x, y, z, ..] => Some([round_to(*x, 2), round_to(*y, 2), round_to(*z, 2)]),
        _ => None,
    }
}

/// 源皮距：任一轴旋转时取各控制点平均值，否则取首个控制点读数
fn source_to_surface_distance(control_points: &[InMemDicomObject], rotational: bool) -> Option<f64> {
    let first = control_points.first()?.opt_f64(tags::SOURCE_TO_SURFACE_DISTANCE)?;
    if !rotational {
        return Some(round_to(first / SSD_UNIT_DIVISOR, 2));
    }

    let readings: Vec<f64> = control_points
        .iter()
        .filter_map(|cp| cp.opt_f64(tags::SOURCE_TO_SURFACE_DISTANCE))
        .map(|ssd| round_to(ssd / SSD_UNIT_DIVISOR, 2))
        .collect();
    let average = readings.iter().sum::<f64>() / readings.len() as f64;
    Some(round_to(average, 2))
}

/// 扫描点数：各控制点累加后减半
fn scan_spot_count(control_points: &[InMemDicomObject]) -> Option<f64> {
    if !control_points.first()?.has(tags::NUMBER_OF_SCAN_SPOT_POSITIONS) {
        return None;
    }
    let total: f64 = control_points
        .iter()
        .map(|cp| cp.f64_or(tags::NUMBER_OF_SCAN_SPOT_POSITIONS, 0.0))
        .sum();
    Some(total / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom::core::VR;
    use rtx_dicom::builder::DatasetBuilder;

    fn cw(n: usize) -> Vec<RotationDirection> {
        vec![RotationDirection::Clockwise; n]
    }

    #[test]
    fn test_change_angle_origin() {
        assert_eq!(change_angle_origin(180.0, ANGLE_THRESHOLD), 180.0);
        assert_eq!(change_angle_origin(181.0, ANGLE_THRESHOLD), -179.0);
        assert_eq!(change_angle_origin(0.0, ANGLE_THRESHOLD), 0.0);
        assert_eq!(change_angle_origin(359.0, ANGLE_THRESHOLD), -1.0);
    }

    #[test]
    fn test_merge_directions() {
        let cw = RotationDirection::Clockwise;
        let cc = RotationDirection::CounterClockwise;
        assert_eq!(merge_directions(&[]), RotationDirection::None);
        assert_eq!(merge_directions(&[cw, cw]), cw);
        assert_eq!(
            merge_directions(&[cc, cw]),
            RotationDirection::CounterThenClockwise
        );
        assert_eq!(
            merge_directions(&[cw, cc, cw]),
            RotationDirection::ClockwiseThenCounter
        );
    }

    #[test]
    fn test_reduce_axis_arc_through_zero() {
        let axis = reduce_axis(&[181.0, 270.0, 0.0, 90.0, 179.0], &cw(5));
        assert_eq!(axis.start, -179.0);
        assert_eq!(axis.end, 179.0);
        assert_eq!(axis.range, 358.0);
        assert_eq!(axis.min, -179.0);
        assert_eq!(axis.max, 179.0);
        assert_eq!(axis.rot_dir, RotationDirection::Clockwise);
    }

    #[test]
    fn test_reduce_axis_counts_multi_arc_sweeps() {
        let axis = reduce_axis(&[0.0, 90.0, 0.0], &[]);
        assert_eq!(axis.range, 180.0);
        assert_eq!(axis.rot_dir, RotationDirection::None);
    }

    #[test]
    fn test_reversed_control_points_keep_range() {
        let forward = [181.0, 200.5, 330.25, 10.0, 45.0];
        let reversed: Vec<f64> = forward.iter().rev().copied().collect();
        let a = reduce_axis(&forward, &cw(5));
        let b = reduce_axis(&reversed, &cw(5));
        assert_eq!(a.range, b.range);
        assert_eq!(a.start, b.end);
        assert_eq!(a.end, b.start);
    }

    #[test]
    fn test_empty_axis_defaults_to_zero() {
        let axis = reduce_axis(&[], &[]);
        assert_eq!(axis.start, 0.0);
        assert_eq!(axis.end, 0.0);
        assert_eq!(axis.range, 0.0);
        assert_eq!(axis.rot_dir, RotationDirection::None);
    }

    #[test]
    fn test_direction_codes_case_insensitive() {
        let cp = |angle: f64, direction: &str| {
            DatasetBuilder::new()
                .num(tags::GANTRY_ANGLE, VR::DS, angle)
                .str(tags::GANTRY_ROTATION_DIRECTION, VR::CS, direction)
                .build()
        };
        let upper = GANTRY.reduce(&[cp(180.0, "CC"), cp(90.0, "CC")]);
        let lower = GANTRY.reduce(&[cp(180.0, "cc"), cp(90.0, "cc")]);
        assert_eq!(upper, lower);

        let ignored = GANTRY.reduce(&[cp(0.0, "NONE")]);
        assert_eq!(ignored.rot_dir, RotationDirection::None);
    }

    #[test]
    fn test_ssd_average_for_rotational_beam() {
        let cp = |ssd: f64| {
            DatasetBuilder::new()
                .num(tags::SOURCE_TO_SURFACE_DISTANCE, VR::DS, ssd)
                .build()
        };
        let cps = vec![cp(900.0), cp(920.0), DatasetBuilder::new().build(), cp(940.0)];
        assert_eq!(source_to_surface_distance(&cps, true), Some(92.0));
        assert_eq!(source_to_surface_distance(&cps, false), Some(90.0));
        assert_eq!(
            source_to_surface_distance(&[DatasetBuilder::new().build()], true),
            None
        );
    }

    #[test]
    fn test_scan_spot_count_is_halved() {
        let cp = |spots: i64| {
            DatasetBuilder::new()
                .int(tags::NUMBER_OF_SCAN_SPOT_POSITIONS, VR::IS, spots)
                .build()
        };
        assert_eq!(scan_spot_count(&[cp(10), cp(10), cp(6)]), Some(13.0));
        assert_eq!(scan_spot_count(&[DatasetBuilder::new().build()]), None);
    }

    #[test]
    fn test_resolve_beam_by_number_then_position() {
        let beam = |number: i64| DatasetBuilder::new().int(tags::BEAM_NUMBER, VR::IS, number).build();
        let beams = vec![beam(1), beam(2)];
        let reference = |number: i64| {
            DatasetBuilder::new()
                .int(tags::REFERENCED_BEAM_NUMBER, VR::IS, number)
                .build()
        };

        let found = resolve_beam(&beams, &reference(2), 0).unwrap();
        assert_eq!(found.opt_i64(tags::BEAM_NUMBER), Some(2));

        let fallback = resolve_beam(&beams, &DatasetBuilder::new().build(), 1).unwrap();
        assert_eq!(fallback.opt_i64(tags::BEAM_NUMBER), Some(2));

        assert!(resolve_beam(&beams, &reference(9), 5).is_err());
    }
}
