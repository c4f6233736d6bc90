//! Scoring heuristics over the valid (face-detected) frames of a session.
//!
//! Every function takes the frames in arrival order. Scores that depend on
//! consecutive deltas assume the client delivered frames in capture order;
//! nothing here re-sorts by timestamp.

use super::stats::standard_deviation;
use crate::config::AnalysisConfig;
use crate::types::{DetectionResult, Expression, ExpressionBreakdown, HeadPose};
use std::collections::HashSet;

/// Minimum frames before the variability-style scores are trusted
const MIN_FRAMES_FOR_VARIABILITY: usize = 5;
/// Minimum frames before posture and engagement are trusted
const MIN_FRAMES_FOR_TREND: usize = 2;
/// Neutral score reported when there is too little data
const INSUFFICIENT_DATA_SCORE: f64 = 50.0;

const HEAD_MOVEMENT_CEILING_DEG: f64 = 30.0;
const HEAD_VARIABILITY_CAP_DEG: f64 = 20.0;
const EYE_CONTACT_VARIABILITY_CAP: f64 = 0.5;
const GAZE_AWAY_LIMIT: f64 = 0.7;
const SIGNIFICANT_MOVEMENT_DEG: f64 = 5.0;

pub fn clip(value: f64) -> f64 {
    value.max(0.0).min(100.0)
}

fn fraction(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

fn mean_eye_contact(frames: &[&DetectionResult]) -> f64 {
    if frames.is_empty() {
        return 0.0;
    }
    frames.iter().map(|f| f.eye_contact().unwrap_or(0.0)).sum::<f64>() / frames.len() as f64
}

fn count_poses(frames: &[&DetectionResult], accept: impl Fn(&HeadPose) -> bool) -> usize {
    frames
        .iter()
        .filter(|f| f.head_pose.as_ref().is_some_and(&accept))
        .count()
}

/// Consecutive frame pairs where both carry a head pose
fn pose_transitions<'a>(
    frames: &'a [&'a DetectionResult],
) -> impl Iterator<Item = (HeadPose, HeadPose)> + 'a {
    frames
        .windows(2)
        .filter_map(|pair| Some((pair[0].head_pose?, pair[1].head_pose?)))
}

fn dominant_sequence(frames: &[&DetectionResult]) -> Vec<Expression> {
    frames.iter().filter_map(|f| f.dominant()).collect()
}

/// Share of frames per dominant expression. Frames with a face but no
/// expression reading still count toward the denominator, so the total
/// drops below 100 when readings are missing.
pub fn expression_breakdown(frames: &[&DetectionResult]) -> ExpressionBreakdown {
    let mut breakdown = ExpressionBreakdown::default();
    if frames.is_empty() {
        return breakdown;
    }

    for dominant in dominant_sequence(frames) {
        *breakdown.get_mut(dominant) += 1.0;
    }

    let total = frames.len() as f64;
    for expression in Expression::ALL {
        *breakdown.get_mut(expression) = breakdown.get(expression) / total * 100.0;
    }
    breakdown
}

pub fn confidence(
    frames: &[&DetectionResult],
    breakdown: &ExpressionBreakdown,
    config: &AnalysisConfig,
) -> f64 {
    let mut value = breakdown.sum_of(&config.confident_expressions) * 0.01;
    value -= breakdown.sum_of(&config.nervous_expressions) * 0.005;
    value += mean_eye_contact(frames) * 0.3;

    let upright = count_poses(frames, |p| p.yaw.abs() < 10.0 && p.pitch.abs() < 15.0 && p.roll.abs() < 10.0);
    value += fraction(upright, frames.len()) * 0.2;

    clip(value * 100.0)
}

pub fn nervousness(
    frames: &[&DetectionResult],
    breakdown: &ExpressionBreakdown,
    config: &AnalysisConfig,
) -> f64 {
    if frames.len() < MIN_FRAMES_FOR_VARIABILITY {
        return 0.0;
    }

    let value = breakdown.sum_of(&config.nervous_expressions) * 0.01
        + head_movement_variability(frames) * 0.4
        + eye_contact_variability(frames) * 0.3;

    clip(value * 100.0)
}

pub fn eye_contact(frames: &[&DetectionResult], config: &AnalysisConfig) -> f64 {
    let good = frames
        .iter()
        .filter(|f| f.eye_contact().unwrap_or(0.0) > config.eye_contact_threshold)
        .count();

    clip((mean_eye_contact(frames) * 0.5 + fraction(good, frames.len()) * 0.5) * 100.0)
}

/// Higher means less distracted
pub fn distraction(frames: &[&DetectionResult], config: &AnalysisConfig) -> f64 {
    if frames.is_empty() {
        return 0.0;
    }

    let distracted = frames
        .iter()
        .filter(|f| match (f.head_pose.as_ref(), f.eye_metrics.as_ref()) {
            (Some(pose), Some(eyes)) => {
                let head_away = pose.yaw.abs() > config.distraction_threshold
                    || pose.pitch.abs() > config.distraction_threshold;
                let eyes_away = eyes.gaze_direction.x.abs() > GAZE_AWAY_LIMIT
                    || eyes.gaze_direction.y.abs() > GAZE_AWAY_LIMIT;
                head_away || eyes_away
            }
            _ => false,
        })
        .count();

    clip((1.0 - fraction(distracted, frames.len())) * 100.0)
}

pub fn head_movement(frames: &[&DetectionResult]) -> f64 {
    if frames.len() < 2 {
        return 0.0;
    }

    let total: f64 = pose_transitions(frames)
        .map(|(prev, curr)| {
            (curr.yaw - prev.yaw).abs() + (curr.pitch - prev.pitch).abs() + (curr.roll - prev.roll).abs()
        })
        .sum();

    let per_frame = total / (frames.len() - 1) as f64;
    clip(per_frame / HEAD_MOVEMENT_CEILING_DEG * 100.0)
}

pub fn attentiveness(eye_contact: f64, distraction: f64) -> f64 {
    eye_contact * 0.6 + distraction * 0.4
}

/// Mean yaw/pitch/roll standard deviation, normalized to [0, 1]
pub fn head_movement_variability(frames: &[&DetectionResult]) -> f64 {
    if frames.len() < MIN_FRAMES_FOR_VARIABILITY {
        return 0.0;
    }

    let poses: Vec<HeadPose> = frames.iter().filter_map(|f| f.head_pose).collect();
    let yaw: Vec<f64> = poses.iter().map(|p| p.yaw).collect();
    let pitch: Vec<f64> = poses.iter().map(|p| p.pitch).collect();
    let roll: Vec<f64> = poses.iter().map(|p| p.roll).collect();

    let combined = (standard_deviation(&yaw) + standard_deviation(&pitch) + standard_deviation(&roll)) / 3.0;
    (combined / HEAD_VARIABILITY_CAP_DEG).min(1.0)
}

/// Eye-contact standard deviation, normalized to [0, 1]
pub fn eye_contact_variability(frames: &[&DetectionResult]) -> f64 {
    if frames.len() < MIN_FRAMES_FOR_VARIABILITY {
        return 0.0;
    }

    let values: Vec<f64> = frames.iter().filter_map(|f| f.eye_contact()).collect();
    (standard_deviation(&values) / EYE_CONTACT_VARIABILITY_CAP).min(1.0)
}

pub fn posture(frames: &[&DetectionResult]) -> f64 {
    if frames.len() < MIN_FRAMES_FOR_TREND {
        return INSUFFICIENT_DATA_SCORE;
    }

    let good = count_poses(frames, |p| p.yaw.abs() < 15.0 && p.pitch.abs() < 15.0 && p.roll.abs() < 10.0);
    clip(fraction(good, frames.len()) * 100.0)
}

pub fn engagement(frames: &[&DetectionResult]) -> f64 {
    if frames.len() < MIN_FRAMES_FOR_TREND {
        return INSUFFICIENT_DATA_SCORE;
    }

    let intensity = frames
        .iter()
        .filter_map(|f| f.expressions.as_ref())
        .map(|e| 1.0 - e.neutral)
        .sum::<f64>()
        / frames.len() as f64;

    clip((intensity * 0.3 + mean_eye_contact(frames) * 0.7) * 100.0)
}

pub fn emotional_stability(frames: &[&DetectionResult]) -> f64 {
    if frames.len() < MIN_FRAMES_FOR_VARIABILITY {
        return INSUFFICIENT_DATA_SCORE;
    }

    let dominants = dominant_sequence(frames);
    if dominants.len() < MIN_FRAMES_FOR_VARIABILITY {
        return INSUFFICIENT_DATA_SCORE;
    }

    let changes = dominants.windows(2).filter(|pair| pair[0] != pair[1]).count();
    clip((1.0 - fraction(changes, dominants.len())) * 100.0)
}

pub fn expression_variability(frames: &[&DetectionResult]) -> f64 {
    if frames.len() < MIN_FRAMES_FOR_VARIABILITY {
        return INSUFFICIENT_DATA_SCORE;
    }

    let distinct: HashSet<Expression> = dominant_sequence(frames).into_iter().collect();
    clip(distinct.len() as f64 / Expression::ALL.len() as f64 * 100.0)
}

pub fn head_movement_rate(frames: &[&DetectionResult]) -> f64 {
    if frames.len() < MIN_FRAMES_FOR_VARIABILITY {
        return INSUFFICIENT_DATA_SCORE;
    }

    let movements = pose_transitions(frames)
        .filter(|(prev, curr)| {
            (curr.yaw - prev.yaw).abs() > SIGNIFICANT_MOVEMENT_DEG
                || (curr.pitch - prev.pitch).abs() > SIGNIFICANT_MOVEMENT_DEG
                || (curr.roll - prev.roll).abs() > SIGNIFICANT_MOVEMENT_DEG
        })
        .count();

    clip(fraction(movements, frames.len() - 1) * 200.0)
}

/// Share of expression changes that follow the natural-transition allow-list
pub fn facial_authenticity(frames: &[&DetectionResult], config: &AnalysisConfig) -> f64 {
    if frames.len() < MIN_FRAMES_FOR_VARIABILITY {
        return INSUFFICIENT_DATA_SCORE;
    }

    let dominants = dominant_sequence(frames);
    let (natural, total) = dominants
        .windows(2)
        .filter(|pair| pair[0] != pair[1])
        .fold((0usize, 0usize), |(natural, total), pair| {
            let is_natural = config.is_natural_transition(pair[0], pair[1]);
            (natural + usize::from(is_natural), total + 1)
        });

    if total == 0 {
        return INSUFFICIENT_DATA_SCORE;
    }
    clip(fraction(natural, total) * 100.0)
}
