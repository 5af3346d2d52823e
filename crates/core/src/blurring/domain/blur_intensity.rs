use std::fmt;
use std::str::FromStr;

/// How strongly detected regions are obscured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlurIntensity {
    Light,
    #[default]
    Medium,
    Heavy,
}

/// Kernel sizing for one intensity: the kernel grows with the region's
/// longest side (`side / size_factor`) and is clamped to `min..=max`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlurSettings {
    pub min_kernel: usize,
    pub max_kernel: usize,
    pub size_factor: usize,
}

impl BlurIntensity {
    pub const ALL: [BlurIntensity; 3] = [Self::Light, Self::Medium, Self::Heavy];

    pub fn settings(self) -> BlurSettings {
        match self {
            BlurIntensity::Light => BlurSettings {
                min_kernel: 9,
                max_kernel: 21,
                size_factor: 15,
            },
            BlurIntensity::Medium => BlurSettings {
                min_kernel: 15,
                max_kernel: 35,
                size_factor: 10,
            },
            BlurIntensity::Heavy => BlurSettings {
                min_kernel: 25,
                max_kernel: 51,
                size_factor: 8,
            },
        }
    }

    /// Odd Gaussian kernel size for a region whose longest side is `longest_side`.
    pub fn kernel_size_for(self, longest_side: usize) -> usize {
        let s = self.settings();
        let size = (longest_side / s.size_factor).clamp(s.min_kernel, s.max_kernel);
        if size % 2 == 0 {
            size + 1
        } else {
            size
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BlurIntensity::Light => "light",
            BlurIntensity::Medium => "medium",
            BlurIntensity::Heavy => "heavy",
        }
    }
}

impl fmt::Display for BlurIntensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown blur intensity '{0}' (expected light, medium or heavy)")]
pub struct ParseBlurIntensityError(String);

impl FromStr for BlurIntensity {
    type Err = ParseBlurIntensityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(BlurIntensity::Light),
            "medium" => Ok(BlurIntensity::Medium),
            "heavy" => Ok(BlurIntensity::Heavy),
            _ => Err(ParseBlurIntensityError(s.to_string())),
        }
    }
}
