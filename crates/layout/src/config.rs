use log::debug;

/// Which sizing rules the layout algorithms follow.
///
/// Both strategies stay available side by side; a report selects one through
/// its compatibility level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompatibilityMode {
    /// Sizing as of the 3.8 engine: negative lengths are percentages of the
    /// containing block, `min-height` fixes the box height unless
    /// `dynamic-height` is set, and row children keep their own height.
    Legacy38,
    /// Negative lengths are invalid and clamp to zero, content grows boxes,
    /// and row children stretch to the height of the row.
    #[default]
    Current,
}

impl CompatibilityMode {
    /// Maps a report's compatibility level onto a sizing strategy. Levels up
    /// to and including 3.8 select legacy sizing.
    pub fn from_level(level: Option<&str>) -> Self {
        let Some(level) = level.map(str::trim).filter(|l| !l.is_empty()) else {
            return CompatibilityMode::Current;
        };
        let mut parts = level.split('.').map(|p| p.parse::<u32>());
        let mode = match (parts.next(), parts.next()) {
            (Some(Ok(major)), minor) => {
                let minor = match minor {
                    Some(Ok(m)) => m,
                    _ => 0,
                };
                if (major, minor) <= (3, 8) {
                    CompatibilityMode::Legacy38
                } else {
                    CompatibilityMode::Current
                }
            }
            _ => CompatibilityMode::Current,
        };
        debug!("Compatibility level '{level}' selects {mode:?} sizing");
        mode
    }

    pub fn is_legacy(self) -> bool {
        self == CompatibilityMode::Legacy38
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutConfig {
    pub compatibility: CompatibilityMode,
    /// Lay out every text element as an inline paragraph pool, even when it
    /// holds a single run.
    pub complex_text: bool,
    /// Unbounded page height. Used by stream exporters, which want the whole
    /// report as one logical page.
    pub flow: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            compatibility: CompatibilityMode::Current,
            complex_text: false,
            flow: false,
        }
    }
}
