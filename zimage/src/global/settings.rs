use zimage_core::settings::Settings;

const DOCUMENTATION: &str = r##"# zimage settings. You may edit this file, but be aware that formatting and comments will not
# be preserved. Missing keys take their default values.

# Colors are written as hex strings: "#RGB", "#RRGGBB", or "#RRGGBBAA".
# Fonts are tables with a `kind` of "builtin", "family" (with `name`), or "file" (with `path`).
# Filters are one of "nearest", "bilinear", or "area". Formats are "png", "jpeg", "bmp", or "tiff".

# Examples:
# [resize]
# format = "jpeg"
# quality = 85
# [meme.font]
# kind = "family"
# name = "Impact"

"##;

#[must_use]
pub fn preferences_dir() -> Option<std::path::PathBuf> {
    let mut base_dir = dirs::preference_dir()?;
    base_dir.push(env!("CARGO_PKG_NAME"));
    Some(base_dir)
}

pub struct UserSettings {
    failed_to_load: bool,
    pub settings: Settings,
}
impl UserSettings {
    const FILENAME: &'static str = "settings.toml";
    /// Shared global settings, loaded from user preferences.
    /// (Or defaulted, if unavailable for some reason)
    #[must_use]
    pub fn get() -> &'static Self {
        static GLOBAL_SETTINGS: std::sync::OnceLock<UserSettings> = std::sync::OnceLock::new();

        GLOBAL_SETTINGS.get_or_init(|| match Self::path() {
            None => Self::no_path(),
            Some(path) => Self::load_or_default(&path),
        })
    }
    /// Where the settings file lives, if there is a preferences dir at all.
    #[must_use]
    pub fn path() -> Option<std::path::PathBuf> {
        let mut dir = preferences_dir()?;
        dir.push(Self::FILENAME);
        Some(dir)
    }
    #[must_use]
    pub fn no_path() -> Self {
        Self {
            failed_to_load: true,
            settings: Settings::default(),
        }
    }
    #[must_use]
    fn load_or_default(path: &std::path::Path) -> Self {
        let settings: anyhow::Result<Settings> = try_block::try_block! {
            let string = std::fs::read_to_string(path)?;
            let settings : Settings = toml::from_str(&string)?;

            Ok(settings)
        };

        match settings {
            Ok(settings) => Self {
                failed_to_load: false,
                settings,
            },
            Err(_) => Self::no_path(),
        }
    }
    /// Return true if loading user's settings failed. Logging isn't up yet when this is
    /// decided, so the caller reports it.
    #[must_use]
    pub fn did_fail_to_load(&self) -> bool {
        self.failed_to_load
    }
    /// Log level named by the settings, or `None` if it isn't one.
    #[must_use]
    pub fn log_level(&self) -> Option<log::LevelFilter> {
        self.settings.log_level.parse().ok()
    }
    pub fn save(&self) -> anyhow::Result<std::path::PathBuf> {
        let mut preferences =
            preferences_dir().ok_or_else(|| anyhow::anyhow!("No preferences dir found"))?;
        // Explicity do *not* create recursively. If not found, the user probably has a good reason.
        // Ignore errors (could already exist). Any real errors will be emitted by file access below.
        let _ = std::fs::DirBuilder::new().create(&preferences);

        preferences.push(Self::FILENAME);
        let mut string = toml::ser::to_string_pretty(&self.settings)?;
        // Prefix some documentation.
        string = DOCUMENTATION.to_owned() + &string;
        std::fs::write(&preferences, string)?;
        Ok(preferences)
    }
}
