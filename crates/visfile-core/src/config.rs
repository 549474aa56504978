/// Tunables for scanning and layout.
///
/// Every value is threaded explicitly into the scanner and layout passes;
/// nothing here is global. All structs deserialize with `#[serde(default)]`
/// so a configuration file only needs the fields it overrides.
use serde::Deserialize;

/// Scanner settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Worker threads for parallel subtree scans. `0` means one per CPU.
    pub workers: usize,

    /// Resolve symlinks and measure their targets. Cycles back into the
    /// current lineage are detected and skipped either way.
    pub follow_symlinks: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            follow_symlinks: true,
        }
    }
}

impl ScanConfig {
    /// Effective worker count (never zero).
    pub fn worker_count(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get().max(1)
        } else {
            self.workers
        }
    }
}

/// Treemap layout settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TreemapConfig {
    /// Nodes at this depth are laid out as leaves. `None` lays out the
    /// whole tree.
    pub max_depth: Option<usize>,
}

/// Pie layout settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PieConfig {
    /// Reference angle in degrees, measured clockwise from 12 o'clock.
    pub start_angle: f64,

    /// Slices narrower than this are folded into one "other" slice.
    pub min_slice_degrees: f64,

    /// Name shown for the folded slice.
    pub other_label: String,
}

impl Default for PieConfig {
    fn default() -> Self {
        Self {
            start_angle: 0.0,
            min_slice_degrees: 1.0,
            other_label: "other".to_string(),
        }
    }
}

/// Palette settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaletteConfig {
    /// How many base hues to cycle through by depth (1..=10).
    pub size: usize,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self { size: 10 }
    }
}

/// Everything the layout passes need, grouped for threading through calls.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    pub treemap: TreemapConfig,
    pub pie: PieConfig,
    pub palette: PaletteConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let pie: PieConfig = serde_json::from_str(r#"{ "min_slice_degrees": 5.0 }"#).unwrap();
        assert_eq!(pie.min_slice_degrees, 5.0);
        assert_eq!(pie.start_angle, 0.0);
        assert_eq!(pie.other_label, "other");
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let res: Result<ScanConfig, _> = serde_json::from_str(r#"{ "wokers": 4 }"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_worker_count_never_zero() {
        assert!(ScanConfig::default().worker_count() >= 1);
        let fixed = ScanConfig {
            workers: 3,
            ..Default::default()
        };
        assert_eq!(fixed.worker_count(), 3);
    }
}
