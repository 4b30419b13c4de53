pub mod arbiter;
pub mod calibration;
pub mod gameplay;
pub mod judgment;
pub mod motion;
pub mod normalizer;
pub mod schedule;
pub mod track;
