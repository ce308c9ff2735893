//! Aspect ratio type used by the cropper.

use std::fmt;
use std::str::FromStr;

use super::CompositeError;

/// Target aspect ratio expressed as whole width and height units.
///
/// Both components are guaranteed to be non-zero; the only way to build a
/// ratio is through [`AspectRatio::new`] or parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AspectRatio {
    width: u32,
    height: u32,
}

impl AspectRatio {
    /// Named ratios offered by the export form.
    pub const PRESETS: [AspectRatio; 7] = [
        AspectRatio::fixed(1, 1),
        AspectRatio::fixed(4, 3),
        AspectRatio::fixed(3, 4),
        AspectRatio::fixed(16, 9),
        AspectRatio::fixed(9, 16),
        AspectRatio::fixed(2, 1),
        AspectRatio::fixed(1, 2),
    ];

    pub const SQUARE: AspectRatio = AspectRatio::fixed(1, 1);

    const fn fixed(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Create a ratio, rejecting zero components.
    pub fn new(width: u32, height: u32) -> Result<Self, CompositeError> {
        if width == 0 || height == 0 {
            return Err(CompositeError::InvalidRatio(format!(
                "both components must be positive, got {}:{}",
                width, height
            )));
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_f64(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::SQUARE
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

impl FromStr for AspectRatio {
    type Err = CompositeError;

    /// Parse `"W:H"` (also accepts `x` or `/` as separator).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (w, h) = s
            .split_once(&[':', 'x', '/'][..])
            .ok_or_else(|| CompositeError::InvalidRatio(format!("expected W:H, got '{}'", s)))?;

        let parse = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| CompositeError::InvalidRatio(format!("expected W:H, got '{}'", s)))
        };

        Self::new(parse(w)?, parse(h)?)
    }
}
