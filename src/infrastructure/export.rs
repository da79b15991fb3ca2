//! Export capabilities
//!
//! Renderers live outside this crate. The set of formats is fixed at compile
//! time and each one carries an explicit availability flag, so callers never
//! probe for a backend at runtime.

use std::fmt;

/// Picture formats a graph can be exported to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Svg,
    Png,
}

impl ExportFormat {
    pub fn name(self) -> &'static str {
        match self {
            Self::Svg => "SVG",
            Self::Png => "PNG",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }

    /// Availability flag of this format in the current build.
    pub fn is_available(self) -> bool {
        CAPABILITIES
            .iter()
            .any(|capability| capability.format == self && capability.available)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (.{})", self.name(), self.extension())
    }
}

/// One export format and whether a renderer for it is linked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capability {
    pub format: ExportFormat,
    pub available: bool,
}

/// No renderer is linked into this crate.
pub const CAPABILITIES: [Capability; 2] = [
    Capability {
        format: ExportFormat::Svg,
        available: false,
    },
    Capability {
        format: ExportFormat::Png,
        available: false,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_format_has_one_capability() {
        for format in [ExportFormat::Svg, ExportFormat::Png] {
            let count = CAPABILITIES.iter().filter(|c| c.format == format).count();
            assert_eq!(count, 1, "{}", format);
            assert!(!format.is_available());
        }
    }
}
