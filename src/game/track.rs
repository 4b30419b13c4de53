use crate::config::{
    PLATFORM_OFFSET_Z, PLATFORM_SINK, PLATFORM_VISIBLE_AHEAD, PLATFORM_VISIBLE_BEHIND,
    TRACK_SPEED,
};
use crate::game::judgment::HitJudge;
use crate::game::motion::{lane_x, level_y};
use serde::Serialize;

/// Render-facing view of one platform at a given audio time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PlatformView {
    pub index: usize,
    pub visible: bool,
    pub position: [f32; 3],
    pub resolved: bool,
    pub is_next: bool,
}

#[inline(always)]
fn track_offset(event_time: f32, audio_time: f32) -> f32 {
    (event_time - audio_time) * TRACK_SPEED
}

pub fn platform_views(judge: &HitJudge, audio_time: f32, next_index: Option<usize>) -> Vec<PlatformView> {
    judge
        .events()
        .iter()
        .zip(judge.states())
        .enumerate()
        .map(|(index, (event, state))| {
            let offset = track_offset(event.time, audio_time);
            PlatformView {
                index,
                visible: offset < PLATFORM_VISIBLE_AHEAD && offset > PLATFORM_VISIBLE_BEHIND,
                position: [
                    lane_x(event.lane),
                    level_y(event.level) - PLATFORM_SINK,
                    PLATFORM_OFFSET_Z + offset,
                ],
                resolved: state.resolved,
                is_next: next_index == Some(index),
            }
        })
        .collect()
}
