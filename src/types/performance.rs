use super::ImageFormat;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityRange {
    pub min: u8,
    pub max: u8,
    pub target: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceBudget {
    pub quality: QualityRange,
    pub max_width: u32,
    pub max_height: u32,
    pub preferred_format: ImageFormat,
    pub dpr: f64,
}
