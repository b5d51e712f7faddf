//! Turns the three on-screen camera controls into a prompt phrase.
//!
//! Vertical angles use one convention throughout: positive means the camera
//! is raised and looks down at the subject. The older `pan_y` control used
//! the opposite sense and is converted with [`vertical_from_pan`].

use std::fmt;

pub const PROMPT_SUFFIX: &str = "consistent character, high quality";

pub const DEFAULT_HORIZONTAL: f64 = 0.0;
pub const DEFAULT_VERTICAL: f64 = 0.0;
pub const DEFAULT_ZOOM: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalView {
    Front,
    FrontRight,
    RightProfile,
    BackRight,
    Back,
    BackLeft,
    LeftProfile,
    FrontLeft,
}

impl HorizontalView {
    pub fn from_degrees(h: f64) -> Self {
        match h {
            h if (-15.0..=15.0).contains(&h) => HorizontalView::Front,
            h if h > 15.0 && h <= 75.0 => HorizontalView::FrontRight,
            h if h > 75.0 && h <= 105.0 => HorizontalView::RightProfile,
            h if h > 105.0 && h <= 165.0 => HorizontalView::BackRight,
            h if h > 165.0 || h < -165.0 => HorizontalView::Back,
            h if (-75.0..-15.0).contains(&h) => HorizontalView::FrontLeft,
            h if (-105.0..-75.0).contains(&h) => HorizontalView::LeftProfile,
            h if (-165.0..-105.0).contains(&h) => HorizontalView::BackLeft,
            // only NaN gets here
            _ => HorizontalView::Front,
        }
    }

    pub fn phrase(self) -> &'static str {
        match self {
            HorizontalView::Front => "front view",
            HorizontalView::FrontRight => "front-right side view",
            HorizontalView::RightProfile => "right side profile view",
            HorizontalView::BackRight => "back-right view",
            HorizontalView::Back => "back view",
            HorizontalView::BackLeft => "back-left view",
            HorizontalView::LeftProfile => "left side profile view",
            HorizontalView::FrontLeft => "front-left side view",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalView {
    EyeLevel,
    HighAngle,
    LowAngle,
}

impl VerticalView {
    pub fn from_degrees(v: f64) -> Self {
        if v > 15.0 {
            VerticalView::HighAngle
        } else if v < -15.0 {
            VerticalView::LowAngle
        } else {
            VerticalView::EyeLevel
        }
    }

    pub fn phrase(self) -> &'static str {
        match self {
            VerticalView::EyeLevel => "eye-level shot",
            VerticalView::HighAngle => "high angle top-down view",
            VerticalView::LowAngle => "low angle worm's-eye view",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotFraming {
    CloseUp,
    Medium,
    Wide,
}

impl ShotFraming {
    /// 30 and 70 themselves are medium shots.
    pub fn from_zoom(zoom: f64) -> Self {
        if zoom > 70.0 {
            ShotFraming::CloseUp
        } else if zoom < 30.0 {
            ShotFraming::Wide
        } else {
            ShotFraming::Medium
        }
    }

    pub fn phrase(self) -> &'static str {
        match self {
            ShotFraming::CloseUp => "close-up shot",
            ShotFraming::Medium => "medium shot",
            ShotFraming::Wide => "wide angle full body shot",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraDescription {
    pub horizontal: HorizontalView,
    pub vertical: VerticalView,
    pub framing: ShotFraming,
}

impl fmt::Display for CameraDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}",
            self.horizontal.phrase(),
            self.vertical.phrase(),
            self.framing.phrase()
        )
    }
}

pub fn describe(h_angle: f64, v_angle: f64, zoom: f64) -> CameraDescription {
    CameraDescription {
        horizontal: HorizontalView::from_degrees(h_angle),
        vertical: VerticalView::from_degrees(v_angle),
        framing: ShotFraming::from_zoom(zoom),
    }
}

/// `pan_y` counts "looking up" as positive; the canonical tilt is the negation.
pub fn vertical_from_pan(pan_y: f64) -> f64 {
    -pan_y
}

pub fn compose_prompt(user_prompt: &str, description: &CameraDescription) -> String {
    format!("{}, {}, {}", user_prompt, description, PROMPT_SUFFIX)
}
