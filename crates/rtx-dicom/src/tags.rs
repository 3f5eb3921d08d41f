//! RT模块使用的DICOM标签
//!
//! 通用患者/检查标签直接取自 `dicom::dictionary_std::tags`，
//! 这里只列出RT Plan / RT Structure Set / RT Dose 专用的标签。

use dicom::core::Tag;

// === RT General Plan / Prescription ===
pub const RT_PLAN_LABEL: Tag = Tag(0x300A, 0x0002);
pub const RT_PLAN_DATE: Tag = Tag(0x300A, 0x0006);
pub const RT_PLAN_TIME: Tag = Tag(0x300A, 0x0007);
pub const DOSE_REFERENCE_SEQUENCE: Tag = Tag(0x300A, 0x0010);
pub const DOSE_REFERENCE_STRUCTURE_TYPE: Tag = Tag(0x300A, 0x0014);
pub const DOSE_REFERENCE_DESCRIPTION: Tag = Tag(0x300A, 0x0016);
pub const TARGET_PRESCRIPTION_DOSE: Tag = Tag(0x300A, 0x0026);

// === RT Fraction Scheme ===
pub const FRACTION_GROUP_SEQUENCE: Tag = Tag(0x300A, 0x0070);
pub const NUMBER_OF_FRACTIONS_PLANNED: Tag = Tag(0x300A, 0x0078);
pub const NUMBER_OF_BEAMS: Tag = Tag(0x300A, 0x0080);
pub const BEAM_DOSE_SPECIFICATION_POINT: Tag = Tag(0x300A, 0x0082);
pub const BEAM_DOSE: Tag = Tag(0x300A, 0x0084);
pub const BEAM_METERSET: Tag = Tag(0x300A, 0x0086);
pub const BRACHY_APPLICATION_SETUP_DOSE: Tag = Tag(0x300A, 0x00A4);
pub const REFERENCED_BEAM_SEQUENCE: Tag = Tag(0x300C, 0x0004);
pub const REFERENCED_BEAM_NUMBER: Tag = Tag(0x300C, 0x0006);
pub const REFERENCED_BRACHY_APPLICATION_SETUP_SEQUENCE: Tag = Tag(0x300C, 0x000A);

// === RT Beams / RT Ion Beams ===
pub const BEAM_SEQUENCE: Tag = Tag(0x300A, 0x00B0);
pub const TREATMENT_MACHINE_NAME: Tag = Tag(0x300A, 0x00B2);
pub const BEAM_NUMBER: Tag = Tag(0x300A, 0x00C0);
pub const BEAM_NAME: Tag = Tag(0x300A, 0x00C2);
pub const BEAM_DESCRIPTION: Tag = Tag(0x300A, 0x00C3);
pub const BEAM_TYPE: Tag = Tag(0x300A, 0x00C4);
pub const RADIATION_TYPE: Tag = Tag(0x300A, 0x00C6);
pub const NUMBER_OF_CONTROL_POINTS: Tag = Tag(0x300A, 0x0110);
pub const CONTROL_POINT_SEQUENCE: Tag = Tag(0x300A, 0x0111);
pub const NOMINAL_BEAM_ENERGY: Tag = Tag(0x300A, 0x0114);
pub const GANTRY_ANGLE: Tag = Tag(0x300A, 0x011E);
pub const GANTRY_ROTATION_DIRECTION: Tag = Tag(0x300A, 0x011F);
pub const BEAM_LIMITING_DEVICE_ANGLE: Tag = Tag(0x300A, 0x0120);
pub const BEAM_LIMITING_DEVICE_ROTATION_DIRECTION: Tag = Tag(0x300A, 0x0121);
pub const PATIENT_SUPPORT_ANGLE: Tag = Tag(0x300A, 0x0122);
pub const PATIENT_SUPPORT_ROTATION_DIRECTION: Tag = Tag(0x300A, 0x0123);
pub const ISOCENTER_POSITION: Tag = Tag(0x300A, 0x012C);
pub const SOURCE_TO_SURFACE_DISTANCE: Tag = Tag(0x300A, 0x0130);
pub const PATIENT_SETUP_SEQUENCE: Tag = Tag(0x300A, 0x0180);
pub const SCAN_MODE: Tag = Tag(0x300A, 0x0308);
pub const NUMBER_OF_SCAN_SPOT_POSITIONS: Tag = Tag(0x300A, 0x0392);
pub const ION_BEAM_SEQUENCE: Tag = Tag(0x300A, 0x03A2);
pub const ION_CONTROL_POINT_SEQUENCE: Tag = Tag(0x300A, 0x03A8);
pub const PATIENT_POSITION: Tag = Tag(0x0018, 0x5100);

// === RT Brachy Application Setups ===
pub const BRACHY_TREATMENT_TECHNIQUE: Tag = Tag(0x300A, 0x0200);
pub const BRACHY_TREATMENT_TYPE: Tag = Tag(0x300A, 0x0202);
pub const APPLICATION_SETUP_SEQUENCE: Tag = Tag(0x300A, 0x0230);
pub const CHANNEL_SEQUENCE: Tag = Tag(0x300A, 0x0280);
pub const CHANNEL_TOTAL_TIME: Tag = Tag(0x300A, 0x0286);

// === Structure Set / ROI Contour / RT ROI Observations ===
pub const STRUCTURE_SET_DATE: Tag = Tag(0x3006, 0x0008);
pub const STRUCTURE_SET_TIME: Tag = Tag(0x3006, 0x0009);
pub const STRUCTURE_SET_ROI_SEQUENCE: Tag = Tag(0x3006, 0x0020);
pub const ROI_NUMBER: Tag = Tag(0x3006, 0x0022);
pub const ROI_NAME: Tag = Tag(0x3006, 0x0026);
pub const ROI_CONTOUR_SEQUENCE: Tag = Tag(0x3006, 0x0039);
pub const CONTOUR_SEQUENCE: Tag = Tag(0x3006, 0x0040);
pub const CONTOUR_GEOMETRIC_TYPE: Tag = Tag(0x3006, 0x0042);
pub const CONTOUR_DATA: Tag = Tag(0x3006, 0x0050);
pub const RT_ROI_OBSERVATIONS_SEQUENCE: Tag = Tag(0x3006, 0x0080);
pub const REFERENCED_ROI_NUMBER: Tag = Tag(0x3006, 0x0084);
pub const RT_ROI_INTERPRETED_TYPE: Tag = Tag(0x3006, 0x00A4);

// === RT Dose ===
pub const TISSUE_HETEROGENEITY_CORRECTION: Tag = Tag(0x3004, 0x0014);
