use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceClass {
    LowEnd,
    MidRange,
    HighEnd,
}

impl DeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LowEnd => "low-end",
            Self::MidRange => "mid-range",
            Self::HighEnd => "high-end",
        }
    }

    /// One step down, saturating at low-end.
    pub fn step_down(self) -> Self {
        match self {
            Self::HighEnd => Self::MidRange,
            Self::MidRange | Self::LowEnd => Self::LowEnd,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    pub class: DeviceClass,
    /// 0..=100, informative only; `class` is what callers act on.
    pub score: u8,
    pub memory_gb: Option<f64>,
    pub processors: Option<u32>,
    pub estimated: bool,
}

impl DeviceCapabilities {
    pub fn estimated(class: DeviceClass, score: u8) -> Self {
        Self {
            class,
            score,
            memory_gb: None,
            processors: None,
            estimated: true,
        }
    }
}
