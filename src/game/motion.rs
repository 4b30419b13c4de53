use crate::config::{
    BOUNCE_GRAVITY, BOUNCE_LAUNCH_VELOCITY, LANE_X_CENTER, LANE_X_LEFT, LANE_X_RIGHT,
    LERP_RATE_X, LERP_RATE_Y, LEVEL_Y_HIGH, LEVEL_Y_LOW, PLATFORM_OFFSET_Z, WOBBLE_AMPLITUDE,
    WOBBLE_FREQUENCY,
};
use crate::core::input::{Lane, Level, PlayerTarget};
use cgmath::Vector3;
use serde::Serialize;

#[inline(always)]
pub const fn lane_x(lane: Lane) -> f32 {
    match lane {
        Lane::Left => LANE_X_LEFT,
        Lane::Center => LANE_X_CENTER,
        Lane::Right => LANE_X_RIGHT,
    }
}

#[inline(always)]
pub const fn level_y(level: Level) -> f32 {
    match level {
        Level::Low => LEVEL_Y_LOW,
        Level::High => LEVEL_Y_HIGH,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AvatarPose {
    pub current_x: f32,
    pub current_y: f32,
    pub bounce_offset: f32,
    pub bounce_velocity: f32,
}

impl Default for AvatarPose {
    fn default() -> Self {
        let home = PlayerTarget::default();
        Self {
            current_x: lane_x(home.lane),
            current_y: level_y(home.level),
            bounce_offset: 0.0,
            bounce_velocity: 0.0,
        }
    }
}

/// Eases the avatar toward its target and plays a single hop per hit.
#[derive(Debug, Clone, Default)]
pub struct AvatarMotionModel {
    pose: AvatarPose,
    elapsed: f32,
}

impl AvatarMotionModel {
    pub fn pose(&self) -> AvatarPose {
        self.pose
    }

    pub fn reset(&mut self) {
        self.pose = AvatarPose::default();
    }

    pub fn trigger_bounce(&mut self) {
        self.pose.bounce_velocity = BOUNCE_LAUNCH_VELOCITY;
    }

    pub fn update(&mut self, target: PlayerTarget, delta_time: f32) {
        let dt = delta_time.max(0.0);
        self.elapsed += dt;

        let lerp_x = (dt * LERP_RATE_X).min(1.0);
        let lerp_y = (dt * LERP_RATE_Y).min(1.0);
        let pose = &mut self.pose;
        pose.current_x += (lane_x(target.lane) - pose.current_x) * lerp_x;
        pose.current_y += (level_y(target.level) - pose.current_y) * lerp_y;

        if pose.bounce_velocity != 0.0 || pose.bounce_offset != 0.0 {
            pose.bounce_offset += pose.bounce_velocity * dt;
            pose.bounce_velocity -= BOUNCE_GRAVITY * dt;
            if pose.bounce_offset < 0.0 {
                pose.bounce_offset = 0.0;
                pose.bounce_velocity = 0.0;
            }
        }
    }

    /// Where the orb is drawn, including the idle wobble.
    pub fn display_position(&self) -> Vector3<f32> {
        let wobble = (self.elapsed * WOBBLE_FREQUENCY).sin() * WOBBLE_AMPLITUDE;
        Vector3::new(
            self.pose.current_x,
            self.pose.current_y + self.pose.bounce_offset + wobble,
            PLATFORM_OFFSET_Z,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_catches_up_faster_than_vertical() {
        let mut model = AvatarMotionModel::default();
        let target = PlayerTarget {
            lane: Lane::Right,
            level: Level::High,
        };
        model.update(target, 0.05);
        let pose = model.pose();
        let x_progress = pose.current_x / LANE_X_RIGHT;
        let y_progress = (pose.current_y - LEVEL_Y_LOW) / (LEVEL_Y_HIGH - LEVEL_Y_LOW);
        assert!((x_progress - 0.4).abs() < 1e-5);
        assert!((y_progress - 0.3).abs() < 1e-5);
    }

    #[test]
    fn large_step_snaps_to_target() {
        let mut model = AvatarMotionModel::default();
        model.update(PlayerTarget { lane: Lane::Left, level: Level::High }, 0.5);
        assert_eq!(model.pose().current_x, LANE_X_LEFT);
        assert_eq!(model.pose().current_y, LEVEL_Y_HIGH);
    }

    #[test]
    fn bounce_is_one_hop_back_to_ground() {
        let mut model = AvatarMotionModel::default();
        model.trigger_bounce();
        let mut peak: f32 = 0.0;
        let mut landed_at = None;
        for step in 0..200 {
            model.update(PlayerTarget::default(), 1.0 / 60.0);
            peak = peak.max(model.pose().bounce_offset);
            if model.pose().bounce_offset == 0.0 {
                landed_at = Some(step);
                break;
            }
        }
        // v^2 / 2g = 0.576 for the continuous hop.
        assert!(peak > 0.5 && peak < 0.62);
        let landed = landed_at.expect("hop lands");
        assert!((55..=60).contains(&landed));
        assert_eq!(model.pose().bounce_velocity, 0.0);

        model.update(PlayerTarget::default(), 1.0 / 60.0);
        assert_eq!(model.pose().bounce_offset, 0.0);
    }

    #[test]
    fn display_position_sits_on_the_track_plane() {
        let model = AvatarMotionModel::default();
        let pos = model.display_position();
        assert_eq!(pos.z, PLATFORM_OFFSET_Z);
        assert_eq!(pos.y, LEVEL_Y_LOW);
    }
}
