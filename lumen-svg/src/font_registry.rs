//! Process-wide font face registry.
//!
//! Faces are registered under a `(family, bold, italic)` key and looked up
//! during text layout. The registry is created lazily on first use, from the
//! configuration passed to [`initialize`] or from `FontConfig::default()`.

use crate::error::{SvgError, SvgResult};
use crate::font_config::{font_config_to_fontdb, FontConfig};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

lazy_static! {
    static ref REGISTRY: Mutex<Option<FontRegistry>> = Mutex::new(None);
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FaceKey {
    family: String,
    bold: bool,
    italic: bool,
}

struct FontRegistry {
    db: fontdb::Database,
    faces: HashMap<FaceKey, fontdb::ID>,
}

impl FontRegistry {
    fn new(config: &FontConfig) -> Self {
        let mut registry = Self {
            db: font_config_to_fontdb(config),
            faces: HashMap::new(),
        };
        for font in &config.custom_fonts {
            if let Err(err) =
                registry.add(&font.family, font.bold, font.italic, font.data.to_vec())
            {
                log::warn!(target: "fonts", "skipping configured font {:?}: {}", font.family, err);
            }
        }
        registry
    }

    fn add<D>(&mut self, family: &str, bold: bool, italic: bool, data: D) -> SvgResult<()>
    where
        D: AsRef<[u8]> + Send + Sync + 'static,
    {
        if let Err(err) = ttf_parser::Face::parse(data.as_ref(), 0) {
            return Err(SvgError::FontLoad(format!("{family}: {err}")));
        }

        let source = fontdb::Source::Binary(Arc::new(data));
        let id = self
            .db
            .load_font_source(source)
            .first()
            .copied()
            .ok_or_else(|| SvgError::FontLoad(format!("{family}: no faces found")))?;

        let key = FaceKey {
            family: family.to_string(),
            bold,
            italic,
        };
        if let Some(previous) = self.faces.insert(key, id) {
            self.db.remove_face(previous);
        }
        log::debug!(target: "fonts", "registered {family} (bold={bold}, italic={italic})");
        Ok(())
    }

    fn resolve(&self, families: &[String], bold: bool, italic: bool) -> Option<fontdb::ID> {
        for family in families {
            let key = FaceKey {
                family: family.clone(),
                bold,
                italic,
            };
            if let Some(id) = self.faces.get(&key) {
                return Some(*id);
            }
        }

        // same family registered with a different style
        for family in families {
            let best = self
                .faces
                .iter()
                .filter(|(key, _)| &key.family == family)
                .min_by_key(|(key, _)| (key.bold != bold, key.italic != italic));
            if let Some((_, id)) = best {
                return Some(*id);
            }
        }

        let weight = if bold {
            fontdb::Weight::BOLD
        } else {
            fontdb::Weight::NORMAL
        };
        let style = if italic {
            fontdb::Style::Italic
        } else {
            fontdb::Style::Normal
        };

        let mut query_families: Vec<fontdb::Family> =
            families.iter().map(|f| generic_family(f)).collect();
        query_families.push(fontdb::Family::SansSerif);
        let query = fontdb::Query {
            families: &query_families,
            weight,
            style,
            ..Default::default()
        };

        self.db
            .query(&query)
            .or_else(|| self.db.faces().next().map(|face| face.id))
    }
}

fn generic_family(name: &str) -> fontdb::Family<'_> {
    match name {
        "serif" => fontdb::Family::Serif,
        "sans-serif" => fontdb::Family::SansSerif,
        "monospace" => fontdb::Family::Monospace,
        "cursive" => fontdb::Family::Cursive,
        "fantasy" => fontdb::Family::Fantasy,
        other => fontdb::Family::Name(other),
    }
}

fn lock() -> MutexGuard<'static, Option<FontRegistry>> {
    REGISTRY.lock().unwrap_or_else(PoisonError::into_inner)
}

fn with_registry<R>(f: impl FnOnce(&mut FontRegistry) -> R) -> R {
    let mut guard = lock();
    let registry = guard.get_or_insert_with(|| FontRegistry::new(&FontConfig::default()));
    f(registry)
}

/// Configure the registry before first use.
///
/// Returns `false` and changes nothing if the registry already exists.
pub fn initialize(config: FontConfig) -> bool {
    let mut guard = lock();
    if guard.is_some() {
        return false;
    }
    *guard = Some(FontRegistry::new(&config));
    true
}

/// Register the font file at `path` under `(family, bold, italic)`.
pub fn add_font_face_from_file(
    family: &str,
    bold: bool,
    italic: bool,
    path: impl AsRef<Path>,
) -> SvgResult<()> {
    let data = std::fs::read(path.as_ref())?;
    add_font_face_from_data(family, bold, italic, data)
}

/// Register in-memory font data under `(family, bold, italic)`.
///
/// The registry keeps `data` alive for as long as it needs the bytes and
/// drops it afterwards, so the value's `Drop` serves as the release hook. Data
/// that fails to parse is dropped before this returns and the registry is
/// left unchanged.
pub fn add_font_face_from_data<D>(family: &str, bold: bool, italic: bool, data: D) -> SvgResult<()>
where
    D: AsRef<[u8]> + Send + Sync + 'static,
{
    with_registry(|registry| registry.add(family, bold, italic, data))
}

/// True if a face was registered under exactly this key.
pub fn has_font_face(family: &str, bold: bool, italic: bool) -> bool {
    let key = FaceKey {
        family: family.to_string(),
        bold,
        italic,
    };
    with_registry(|registry| registry.faces.contains_key(&key))
}

/// Run `f` with the best face for the requested families and style.
///
/// Returns `None` when no face is available at all.
pub(crate) fn with_face<R>(
    families: &[String],
    bold: bool,
    italic: bool,
    f: impl FnOnce(&ttf_parser::Face) -> R,
) -> Option<R> {
    with_registry(|registry| {
        let id = registry.resolve(families, bold, italic)?;
        registry
            .db
            .with_face_data(id, |data, index| {
                ttf_parser::Face::parse(data, index).ok().map(|face| f(&face))
            })
            .flatten()
    })
}
