//! Configuration loading and management.

use std::path::{Path, PathBuf};

use bk_core::Rgb;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Valid fixed UTC offsets in hours.
pub const UTC_OFFSET_RANGE: std::ops::RangeInclusive<i8> = -12..=14;

/// Colors offered when entering section settings.
const DEFAULT_PALETTE: [Rgb; 8] = [
    Rgb::new(0x00, 0x00, 0x75),
    Rgb::new(0x42, 0xd4, 0xf4),
    Rgb::new(0x3c, 0xb4, 0x4b),
    Rgb::new(0xf0, 0x32, 0xe6),
    Rgb::new(0xe6, 0x19, 0x4b),
    Rgb::new(0xf5, 0x82, 0x31),
    Rgb::new(0xff, 0xe1, 0x19),
    Rgb::new(0x80, 0x00, 0x00),
];

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Hours added to UTC marker times for display.
    pub utc_offset_hours: i8,
    /// Where `extract` writes the marker table.
    pub extract_output: PathBuf,
    /// Where `kubios` writes the sample file.
    pub kubios_output: PathBuf,
    /// Colors offered by the section settings prompt.
    pub palette: Vec<Rgb>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            utc_offset_hours: -5,
            extract_output: PathBuf::from("output.csv"),
            kubios_output: PathBuf::from("Kubios_Samples.csv"),
            palette: DEFAULT_PALETTE.to_vec(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (BIOKUBIOS_*)
        figment = figment.merge(Env::prefixed("BIOKUBIOS_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for biokubios.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("biokubios"))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    #[test]
    fn test_dirs_config_path_ends_with_biokubios() {
        let path = dirs_config_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "biokubios");
    }

    #[test]
    fn test_default_config_values() {
        let config = Config::default();
        assert_eq!(config.utc_offset_hours, -5);
        assert_eq!(config.extract_output, PathBuf::from("output.csv"));
        assert_eq!(config.kubios_output, PathBuf::from("Kubios_Samples.csv"));
        assert_eq!(config.palette.len(), 8);
        assert_eq!(config.palette[0].to_string(), "#000075");
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r##"utc_offset_hours = 2
extract_output = "markers.csv"
palette = ["#ff0000", "#00ff00"]"##
        )
        .unwrap();
        file.flush().unwrap();

        let config = Config::load_from(Some(file.path())).unwrap();

        assert_eq!(config.utc_offset_hours, 2);
        assert_eq!(config.extract_output, PathBuf::from("markers.csv"));
        assert_eq!(config.kubios_output, PathBuf::from("Kubios_Samples.csv"));
        assert_eq!(config.palette, [Rgb::new(255, 0, 0), Rgb::new(0, 255, 0)]);
    }
}
