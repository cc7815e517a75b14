//! Font registry configuration.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for the process-wide font registry.
///
/// Install it with [`crate::font_registry::initialize`] before any text is laid
/// out. Without an explicit configuration the registry starts from
/// `FontConfig::default()`, which scans the system fonts.
#[derive(Clone, Debug)]
pub struct FontConfig {
    /// Whether to load system fonts (default: true).
    pub load_system_fonts: bool,
    /// Additional directories to scan for font files.
    pub font_dirs: Vec<PathBuf>,
    /// Faces registered under an explicit `(family, bold, italic)` key.
    pub custom_fonts: Vec<CustomFont>,
    /// Concrete families backing the CSS generic family names.
    pub generic_families: GenericFamilyMap,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            load_system_fonts: true,
            font_dirs: Vec::new(),
            custom_fonts: Vec::new(),
            generic_families: GenericFamilyMap::defaults(),
        }
    }
}

/// Font file bytes registered under a family name and style.
#[derive(Clone, Debug)]
pub struct CustomFont {
    pub family: String,
    pub bold: bool,
    pub italic: bool,
    /// Raw TTF/OTF data. Arc-wrapped for cheap cloning.
    pub data: Arc<Vec<u8>>,
}

/// Concrete families for each CSS generic family, in priority order.
#[derive(Clone, Debug, Default)]
pub struct GenericFamilyMap {
    pub serif: Vec<String>,
    pub sans_serif: Vec<String>,
    pub monospace: Vec<String>,
    pub cursive: Vec<String>,
    pub fantasy: Vec<String>,
}

impl GenericFamilyMap {
    /// Common cross-platform choices for each generic family.
    pub fn defaults() -> Self {
        Self {
            sans_serif: vec![
                "Arial".into(),
                "Helvetica".into(),
                "Liberation Sans".into(),
                "DejaVu Sans".into(),
            ],
            monospace: vec![
                "Courier New".into(),
                "Courier".into(),
                "Liberation Mono".into(),
                "DejaVu Sans Mono".into(),
            ],
            serif: vec![
                "Times New Roman".into(),
                "Times".into(),
                "Liberation Serif".into(),
                "DejaVu Serif".into(),
            ],
            cursive: vec!["Comic Sans MS".into(), "Apple Chancery".into()],
            fantasy: vec!["Impact".into(), "Papyrus".into()],
        }
    }
}

/// Build a font database from `config`.
///
/// Custom fonts are not loaded here; the registry loads them so it can record
/// their keys.
pub(crate) fn font_config_to_fontdb(config: &FontConfig) -> fontdb::Database {
    let mut db = fontdb::Database::new();

    if config.load_system_fonts {
        db.load_system_fonts();
    }

    for dir in &config.font_dirs {
        db.load_fonts_dir(dir);
    }

    apply_generic_families(&mut db, &config.generic_families);
    log::debug!(target: "fonts", "font database holds {} faces", db.len());
    db
}

/// Point each generic family at the first available preference.
fn apply_generic_families(db: &mut fontdb::Database, families: &GenericFamilyMap) {
    let available: HashSet<String> = db
        .faces()
        .flat_map(|face| face.families.iter().map(|(name, _)| name.clone()))
        .collect();

    let pick = |candidates: &[String]| -> Option<String> {
        candidates.iter().find(|f| available.contains(*f)).cloned()
    };

    if let Some(family) = pick(&families.sans_serif) {
        db.set_sans_serif_family(family);
    }
    if let Some(family) = pick(&families.serif) {
        db.set_serif_family(family);
    }
    if let Some(family) = pick(&families.monospace) {
        db.set_monospace_family(family);
    }
    if let Some(family) = pick(&families.cursive) {
        db.set_cursive_family(family);
    }
    if let Some(family) = pick(&families.fantasy) {
        db.set_fantasy_family(family);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_font_config() {
        let config = FontConfig::default();
        assert!(config.load_system_fonts);
        assert!(config.font_dirs.is_empty());
        assert!(config.custom_fonts.is_empty());
        assert_eq!(config.generic_families.sans_serif[0], "Arial");
    }

    #[test]
    fn test_no_system_fonts_gives_empty_database() {
        let config = FontConfig {
            load_system_fonts: false,
            ..FontConfig::default()
        };
        let db = font_config_to_fontdb(&config);
        assert_eq!(db.faces().count(), 0);
    }

    #[test]
    fn test_custom_font_clone_shares_data() {
        let font = CustomFont {
            family: "Test".into(),
            bold: false,
            italic: false,
            data: Arc::new(vec![0u8; 16]),
        };
        let config = FontConfig {
            custom_fonts: vec![font],
            ..FontConfig::default()
        };
        let cloned = config.clone();
        assert!(Arc::ptr_eq(
            &config.custom_fonts[0].data,
            &cloned.custom_fonts[0].data
        ));
    }
}
