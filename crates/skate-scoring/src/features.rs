//! Frame feature extraction.
//!
//! Turns one (keypoints, board box) pair into a [`FrameSignal`]. Every
//! function here is pure; the batch reference job and the online scorer both
//! call into this module so the formulas cannot drift apart.
//!
//! # Angle convention
//!
//! Angles are computed in image coordinates (y grows downward) and reported in
//! degrees, normalized into (-180, 180]:
//!
//! - `board_angle = atan2(y2 - y1, x2 - x1)` on the raw box corners.
//! - `torso_angle = atan2(dx, dy)` of the vector from the mid-hip point to the
//!   mid-shoulder point, i.e. tilt measured from the downward vertical. An
//!   upright skater reads close to +/-180, so a leaning torso alternates
//!   across the branch cut and shows up as a large spread. The built-in
//!   reference table was aggregated under this convention.
//!
//! Both are invariant under translation. Under a vertical flip the board
//! angle negates and the torso angle maps to `180 - angle`.
//! Reference profiles must be produced with this same convention.

use skate_models::{BoardBox, FrameSignal, KeypointSet, Landmark, Point2};

use crate::error::{ScoringError, ScoringResult};

/// Foot-to-board distance: mean of the distances from each ankle to the
/// board center.
pub fn foot_board_distance(keypoints: &KeypointSet, board: &BoardBox) -> ScoringResult<f64> {
    let center = board.center();
    let left = landmark(keypoints, Landmark::LeftAnkle)?;
    let right = landmark(keypoints, Landmark::RightAnkle)?;
    Ok((left.distance(&center) + right.distance(&center)) / 2.0)
}

/// Board orientation in degrees.
pub fn board_angle(board: &BoardBox) -> f64 {
    normalize_degrees(board.dy().atan2(board.dx()).to_degrees())
}

/// Torso tilt in degrees, measured from the downward image vertical.
pub fn torso_angle(keypoints: &KeypointSet) -> ScoringResult<f64> {
    let mid_shoulder = landmark(keypoints, Landmark::LeftShoulder)?
        .midpoint(landmark(keypoints, Landmark::RightShoulder)?);
    let mid_hip =
        landmark(keypoints, Landmark::LeftHip)?.midpoint(landmark(keypoints, Landmark::RightHip)?);

    let dx = mid_shoulder.x - mid_hip.x;
    let dy = mid_shoulder.y - mid_hip.y;
    Ok(normalize_degrees(dx.atan2(dy).to_degrees()))
}

/// Derive the full frame signal.
///
/// Fails with `InsufficientLandmarks` when the keypoint set is shorter than
/// the landmark schema; callers drop the frame.
pub fn extract_frame_signal(keypoints: &KeypointSet, board: &BoardBox) -> ScoringResult<FrameSignal> {
    ensure_schema(keypoints)?;
    Ok(FrameSignal::new(
        foot_board_distance(keypoints, board)?,
        board_angle(board),
        torso_angle(keypoints)?,
    ))
}

/// Map an angle in degrees into (-180, 180].
pub fn normalize_degrees(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return degrees;
    }
    let mut wrapped = degrees % 360.0;
    if wrapped <= -180.0 {
        wrapped += 360.0;
    } else if wrapped > 180.0 {
        wrapped -= 360.0;
    }
    wrapped
}

fn ensure_schema(keypoints: &KeypointSet) -> ScoringResult<()> {
    if keypoints.is_complete() {
        Ok(())
    } else {
        Err(ScoringError::InsufficientLandmarks {
            required: Landmark::COUNT,
            found: keypoints.len(),
        })
    }
}

fn landmark(keypoints: &KeypointSet, landmark: Landmark) -> ScoringResult<&Point2> {
    keypoints
        .get(landmark)
        .ok_or(ScoringError::InsufficientLandmarks {
            required: Landmark::COUNT,
            found: keypoints.len(),
        })
}
