use crate::types::Config;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GestureMode;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_carry_documented_constants() {
        let config = Config::default();
        assert_eq!(config.fall.conf_threshold, 0.45);
        assert_eq!(config.fall.horizontal_angle_deg, 55.0);
        assert_eq!(config.fall.sudden_speed_thresh, 280.0);
        assert_eq!(config.help.hold_s, 6.0);
        assert_eq!(config.notify.cooldown_s, 60.0);
        assert_eq!(
            config.help.resolved_sustain_s(GestureMode::ArmsCrossed),
            0.4
        );
        assert_eq!(config.help.resolved_sustain_s(GestureMode::Waving), 1.5);
    }

    #[test]
    fn test_partial_yaml_overrides() {
        let yaml = "gesture:\n  mode: waving\nfall:\n  conf_threshold: 0.6\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.gesture.mode, GestureMode::Waving);
        assert_eq!(config.fall.conf_threshold, 0.6);
        // Untouched sections keep their defaults.
        assert_eq!(config.fall.ground_y_ratio, 0.8);
        assert_eq!(config.waving.min_swings, 2);
    }
}
