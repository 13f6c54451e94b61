//! Turns an imported body into animation roles, spine ordering and the root base pose.

use crate::assets::BodyImport;
use crate::ecs::{FinKind, PartRoles, Pose};
use glam::Vec3;
use std::f32::consts::FRAC_PI_2;

/// Head-to-tail length the body is scaled to.
pub const TARGET_LENGTH: f32 = 0.6;
pub const BASE_ROTATION: Vec3 = Vec3::new(0.0, -FRAC_PI_2, 0.0);
pub const IMPORT_METALNESS: f32 = 0.4;
pub const IMPORT_ROUGHNESS: f32 = 0.45;

/// Role from naming convention. Tail wins over fin, fin over eye; anything else is body.
pub fn classify_part(name: &str) -> (PartRoles, Option<FinKind>) {
    let lower = name.to_lowercase();
    if lower.contains("tail") {
        return (PartRoles::TAIL, None);
    }
    if lower.contains("dorsal") {
        return (PartRoles::FIN, Some(FinKind::Dorsal));
    }
    if lower.contains("pectoral") {
        return (PartRoles::FIN, Some(FinKind::Pectoral));
    }
    if lower.contains("anal") {
        return (PartRoles::FIN, Some(FinKind::Anal));
    }
    if lower.contains("fin") {
        return (PartRoles::FIN, Some(FinKind::Generic));
    }
    if lower.contains("eye") {
        return (PartRoles::EYE, None);
    }
    (PartRoles::BODY, None)
}

pub fn fit_scale(bounds: Option<(Vec3, Vec3)>) -> f32 {
    match bounds {
        Some((min, max)) if max.x - min.x > f32::EPSILON => TARGET_LENGTH / (max.x - min.x),
        _ => 1.0,
    }
}

pub fn root_base_pose(import: &BodyImport) -> Pose {
    Pose { translation: Vec3::ZERO, rotation: BASE_ROTATION, scale: Vec3::splat(fit_scale(import.bounds)) }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartPlan {
    /// Index into `BodyImport::parts`.
    pub part: usize,
    pub roles: PartRoles,
    pub fin_kind: Option<FinKind>,
    pub tail_index: Option<usize>,
    pub fin_index: Option<usize>,
    pub spine_t: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BodyPlan {
    pub root: Pose,
    pub parts: Vec<PartPlan>,
    /// Part indices ordered head to tail.
    pub spine: Vec<usize>,
}

pub fn plan_body(import: &BodyImport) -> BodyPlan {
    let root = root_base_pose(import);
    let root_matrix = root.matrix();

    let mut tail_count = 0;
    let mut fin_count = 0;
    let mut parts: Vec<PartPlan> = import
        .parts
        .iter()
        .enumerate()
        .map(|(part, desc)| {
            let (roles, fin_kind) = classify_part(&desc.name);
            let tail_index = roles.contains(PartRoles::TAIL).then(|| {
                tail_count += 1;
                tail_count - 1
            });
            let fin_index = roles.contains(PartRoles::FIN).then(|| {
                fin_count += 1;
                fin_count - 1
            });
            PartPlan { part, roles, fin_kind, tail_index, fin_index, spine_t: None }
        })
        .collect();

    let has_body = parts.iter().any(|p| p.roles.contains(PartRoles::BODY));
    let candidates: Vec<usize> = if has_body {
        parts.iter().filter(|p| p.roles.contains(PartRoles::BODY)).map(|p| p.part).collect()
    } else {
        let tails = parts.iter().filter(|p| p.roles.contains(PartRoles::TAIL));
        let fins = parts.iter().filter(|p| p.roles.contains(PartRoles::FIN));
        tails.chain(fins).map(|p| p.part).collect()
    };

    let xs: Vec<f32> = candidates
        .iter()
        .map(|&i| root_matrix.transform_point3(import.parts[i].model_position).x)
        .collect();
    let min_x = xs.iter().copied().fold(f32::INFINITY, f32::min);
    let max_x = xs.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let extent = max_x - min_x;

    let mut spine: Vec<(usize, f32)> = candidates
        .iter()
        .zip(&xs)
        .map(|(&i, &x)| (i, if extent > 0.0 { (x - min_x) / extent } else { 0.0 }))
        .collect();
    spine.sort_by(|a, b| a.1.total_cmp(&b.1));

    for &(i, t) in &spine {
        let plan = &mut parts[i];
        plan.roles |= PartRoles::SPINE;
        plan.spine_t = Some(t);
    }

    BodyPlan { root, parts, spine: spine.into_iter().map(|(i, _)| i).collect() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::BodyPartDesc;

    #[test]
    fn classification_follows_name_precedence() {
        assert_eq!(classify_part("Tail_Fin_L"), (PartRoles::TAIL, None));
        assert_eq!(classify_part("DorsalFin"), (PartRoles::FIN, Some(FinKind::Dorsal)));
        assert_eq!(classify_part("pectoral.R"), (PartRoles::FIN, Some(FinKind::Pectoral)));
        assert_eq!(classify_part("ANAL"), (PartRoles::FIN, Some(FinKind::Anal)));
        assert_eq!(classify_part("fin_misc"), (PartRoles::FIN, Some(FinKind::Generic)));
        assert_eq!(classify_part("Eye_L"), (PartRoles::EYE, None));
        assert_eq!(classify_part("Torso"), (PartRoles::BODY, None));
    }

    #[test]
    fn spine_orders_body_parts_along_world_x() {
        // Base rotation maps model -z onto world +x.
        let import = BodyImport::from_parts(vec![
            BodyPartDesc::new("body_mid", Vec3::new(0.0, 0.0, 0.0)),
            BodyPartDesc::new("body_head", Vec3::new(0.0, 0.0, 1.0)),
            BodyPartDesc::new("tail", Vec3::new(0.0, 0.0, -1.5)),
            BodyPartDesc::new("body_rear", Vec3::new(0.0, 0.0, -1.0)),
            BodyPartDesc::new("eye", Vec3::new(0.1, 0.0, 1.1)),
        ]);
        let plan = plan_body(&import);
        assert_eq!(plan.spine, vec![1, 0, 3]);
        let ts: Vec<f32> = plan.spine.iter().map(|&i| plan.parts[i].spine_t.unwrap()).collect();
        assert!((ts[0]).abs() < 1e-5 && (ts[1] - 0.5).abs() < 1e-5 && (ts[2] - 1.0).abs() < 1e-5);
        assert!(plan.parts[2].spine_t.is_none());
        assert_eq!(plan.parts[2].tail_index, Some(0));
        assert!(!plan.parts[4].roles.contains(PartRoles::SPINE));
    }

    #[test]
    fn spine_falls_back_to_tail_and_fins() {
        let import = BodyImport::from_parts(vec![
            BodyPartDesc::new("tail", Vec3::new(0.0, 0.0, 0.0)),
            BodyPartDesc::new("dorsal", Vec3::new(0.0, 0.0, 0.0)),
            BodyPartDesc::new("eye", Vec3::new(0.0, 0.0, 0.0)),
        ]);
        let plan = plan_body(&import);
        assert_eq!(plan.spine.len(), 2);
        // Zero extent puts every segment at the head.
        assert!(plan.spine.iter().all(|&i| plan.parts[i].spine_t == Some(0.0)));
        assert_eq!(plan.parts[1].fin_index, Some(0));
    }

    #[test]
    fn root_is_scaled_to_target_length() {
        let import = BodyImport::from_parts(vec![
            BodyPartDesc::new("a", Vec3::new(-1.0, 0.0, 0.0)),
            BodyPartDesc::new("b", Vec3::new(2.0, 0.0, 0.0)),
        ]);
        let pose = root_base_pose(&import);
        assert!((pose.scale.x - 0.2).abs() < 1e-6);
        assert_eq!(pose.rotation, BASE_ROTATION);
        assert_eq!(fit_scale(None), 1.0);
    }
}
