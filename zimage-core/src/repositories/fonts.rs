//! # Font Faces
//!
//! Resolves [`FontDescriptor`]s into loaded face data. System fonts are enumerated once, on the first
//! family lookup, and every face loaded is kept for the life of the process.

use std::sync::{Arc, OnceLock};

use rustybuzz::ttf_parser;

use crate::text::FontDescriptor;

/// Get the shared global instance of the face repository.
pub fn faces() -> &'static Faces {
    static FACES: OnceLock<Faces> = OnceLock::new();
    FACES.get_or_init(Faces::new_system)
}

/// Location of fonts installed for zimage alone, searched after the system fonts.
///
/// The directory may not exist.
#[must_use]
pub fn local_fonts() -> Option<std::path::PathBuf> {
    // *Not* LocalData, as we'd like this data to be available on Windows network logins.
    let mut data = dirs::data_dir()?;
    data.push(env!("CARGO_PKG_NAME"));
    data.push("fonts");
    Some(data)
}

/// Common families standing in for each generic family, in order of preference.
const SERIF: &[&str] = &["Times New Roman", "DejaVu Serif", "Liberation Serif", "Noto Serif"];
const SANS_SERIF: &[&str] = &["Arial", "DejaVu Sans", "Liberation Sans", "Noto Sans", "Helvetica"];
const MONOSPACE: &[&str] = &["Courier New", "DejaVu Sans Mono", "Liberation Mono", "Noto Sans Mono"];

/// Point each generic family at the first installed candidate. Left at fontdb's default if none are.
fn pick_generic_families(db: &mut fontdb::Database) {
    let installed = |db: &fontdb::Database, candidates: &[&'static str]| {
        candidates.iter().copied().find(|name| {
            db.faces()
                .any(|face| face.families.iter().any(|(family, _)| family == name))
        })
    };
    if let Some(name) = installed(db, SERIF) {
        db.set_serif_family(name);
    }
    if let Some(name) = installed(db, SANS_SERIF) {
        log::trace!("sans-serif is {name}");
        db.set_sans_serif_family(name);
    }
    if let Some(name) = installed(db, MONOSPACE) {
        db.set_monospace_family(name);
    }
}

/// Raw bytes of a font file, and which face within it to use.
pub struct FaceData {
    data: Arc<[u8]>,
    index: u32,
}
impl FaceData {
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }
}
impl std::fmt::Debug for FaceData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaceData")
            .field("bytes", &human_bytes::human_bytes(self.data.len() as f64))
            .field("index", &self.index)
            .finish()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum FaceError {
    #[error("no installed font matches")]
    NotFound,
    #[error("the builtin face has no font data")]
    Builtin,
    #[error("parsing error")]
    BadFace,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Global Font singleton. Owns the font database and the faces loaded from it.
pub struct Faces {
    /// Enumerated lazily, as scanning system fonts is slow and most uses never need it.
    db: OnceLock<fontdb::Database>,
    loaded: parking_lot::RwLock<hashbrown::HashMap<FontDescriptor, Arc<FaceData>>>,
}
impl Faces {
    /// Create the repository over the predefined system font folders and the zimage local fonts.
    #[must_use]
    pub fn new_system() -> Self {
        Self {
            db: OnceLock::new(),
            loaded: parking_lot::RwLock::new(hashbrown::HashMap::new()),
        }
    }
    fn db(&self) -> &fontdb::Database {
        self.db.get_or_init(|| {
            let mut db = fontdb::Database::new();
            db.load_system_fonts();
            if let Some(locals) = local_fonts() {
                // This directory may not even exist. Fails silently (desired behavior)
                db.load_fonts_dir(locals);
            }
            pick_generic_families(&mut db);
            log::debug!("font database holds {} faces", db.len());
            db
        })
    }
    /// Load (or fetch the already loaded) face for a descriptor.
    pub fn load(&self, descriptor: &FontDescriptor) -> Result<Arc<FaceData>, FaceError> {
        if let Some(face) = self.loaded.read().get(descriptor) {
            return Ok(face.clone());
        }
        let face = Arc::new(match descriptor {
            FontDescriptor::Builtin => return Err(FaceError::Builtin),
            FontDescriptor::Family { name, bold, italic } => self.query(name, *bold, *italic)?,
            FontDescriptor::File { path, index } => {
                let data: Arc<[u8]> = std::fs::read(path)?.into();
                FaceData {
                    data,
                    index: *index,
                }
            }
        });
        ttf_parser::Face::parse(face.data(), face.index()).map_err(|_| FaceError::BadFace)?;
        log::debug!("loaded font {descriptor}: {face:?}");
        // Another thread may have raced us here, either result is equivalent.
        self.loaded
            .write()
            .entry(descriptor.clone())
            .or_insert_with(|| face.clone());
        Ok(face)
    }
    fn query(&self, name: &str, bold: bool, italic: bool) -> Result<FaceData, FaceError> {
        let family = match name.to_ascii_lowercase().as_str() {
            "serif" => fontdb::Family::Serif,
            "sans-serif" | "sans serif" => fontdb::Family::SansSerif,
            "monospace" => fontdb::Family::Monospace,
            _ => fontdb::Family::Name(name),
        };
        let families = [family];
        let query = fontdb::Query {
            families: &families,
            weight: if bold {
                fontdb::Weight::BOLD
            } else {
                fontdb::Weight::NORMAL
            },
            stretch: fontdb::Stretch::Normal,
            style: if italic {
                fontdb::Style::Italic
            } else {
                fontdb::Style::Normal
            },
        };
        let db = self.db();
        let id = db.query(&query).ok_or(FaceError::NotFound)?;
        db.with_face_data(id, |data, index| FaceData {
            data: data.into(),
            index,
        })
        .ok_or(FaceError::NotFound)
    }
}

#[cfg(test)]
mod test {
    use super::{FaceError, Faces};
    use crate::text::FontDescriptor;
    #[test]
    fn builtin_has_no_data() {
        let faces = Faces::new_system();
        assert!(matches!(
            faces.load(&FontDescriptor::Builtin),
            Err(FaceError::Builtin)
        ));
    }
    #[test]
    fn garbage_file_is_bad_face() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.ttf");
        std::fs::write(&path, b"definitely not a font").unwrap();
        let faces = Faces::new_system();
        assert!(matches!(
            faces.load(&FontDescriptor::File { path, index: 0 }),
            Err(FaceError::BadFace)
        ));
    }
    #[test]
    fn generic_families_prefer_installed() {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        super::pick_generic_families(&mut db);
        // Whenever a candidate is installed, the generic family resolves.
        let has_candidate = db.faces().any(|face| {
            face.families
                .iter()
                .any(|(family, _)| super::SANS_SERIF.contains(&family.as_str()))
        });
        if has_candidate {
            let query = fontdb::Query {
                families: &[fontdb::Family::SansSerif],
                ..fontdb::Query::default()
            };
            assert!(db.query(&query).is_some());
        }
    }
    #[test]
    fn missing_file_is_io() {
        let faces = Faces::new_system();
        let missing = FontDescriptor::File {
            path: "/nonexistent/zimage/font.otf".into(),
            index: 0,
        };
        assert!(matches!(faces.load(&missing), Err(FaceError::Io(_))));
    }
}
