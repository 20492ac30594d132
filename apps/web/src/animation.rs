#[derive(Clone, Copy, PartialEq, Eq)]
pub enum SpinnerMode {
    Running,
    Idle,
}

const SPINNER_FRAMES: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];
const SPINNER_FRAMES_PER_SECOND: f64 = 10.0;
const SPINNER_MAX_FRAME_DELTA: f64 = 0.25;
#[allow(clippy::cast_precision_loss)]
const SPINNER_CYCLE: f64 = SPINNER_FRAMES.len() as f64;

/// Advances the spinner phase by wall-clock time. The phase only moves while
/// something is loading and never jumps more than a quarter second per frame.
pub fn advance_spinner(
    phase: f64,
    last_tick: Option<f64>,
    now_seconds: f64,
    mode: SpinnerMode,
) -> (f64, Option<f64>) {
    let delta = last_tick
        .map(|last| (now_seconds - last).clamp(0.0, SPINNER_MAX_FRAME_DELTA))
        .unwrap_or(0.0);

    let next_phase = match mode {
        SpinnerMode::Running => (phase + delta * SPINNER_FRAMES_PER_SECOND).rem_euclid(SPINNER_CYCLE),
        SpinnerMode::Idle => phase.rem_euclid(SPINNER_CYCLE),
    };

    (next_phase, Some(now_seconds))
}

pub fn spinner_glyph(phase: f64) -> &'static str {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let index = phase.rem_euclid(SPINNER_CYCLE).floor() as usize;
    SPINNER_FRAMES[index % SPINNER_FRAMES.len()]
}
