//! Central resource registry: the single ID authority for one document
//!
//! Every resource ID in a document — asset, format, effect, compound
//! media — comes out of this registry. It scans the document it is
//! constructed over, so extending a loaded file is as safe as building a
//! fresh one, and it hands out IDs under a lock so concurrent
//! transactions can never be issued the same ID.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

use tracing::debug;

use crate::ids;
use crate::model::{Asset, Effect, Fcpxml, Format, Media};

/// Registry over one document. All access is serialized through an
/// internal lock; methods take `&self` and may be called from concurrent
/// transactions sharing this instance.
pub struct ResourceRegistry<'a> {
    inner: Mutex<Inner<'a>>,
}

struct Inner<'a> {
    doc: &'a mut Fcpxml,
    used_ids: HashSet<String>,
    assets: HashMap<String, usize>,
    formats: HashMap<String, usize>,
    effects: HashMap<String, usize>,
    media: HashMap<String, usize>,
    next_id: usize,
    uid_cache: HashMap<String, String>,
}

impl<'a> ResourceRegistry<'a> {
    /// Build a registry over `doc`, seeding the used-ID set and typed
    /// maps from every resource already present. The counter starts one
    /// past the total resource count, so loading an existing document
    /// and continuing to add resources needs no extra bookkeeping.
    pub fn new(doc: &'a mut Fcpxml) -> ResourceRegistry<'a> {
        let mut used_ids = HashSet::new();
        let mut assets = HashMap::new();
        let mut formats = HashMap::new();
        let mut effects = HashMap::new();
        let mut media = HashMap::new();

        for (i, asset) in doc.resources.assets.iter().enumerate() {
            used_ids.insert(asset.id.clone());
            assets.insert(asset.id.clone(), i);
        }
        for (i, format) in doc.resources.formats.iter().enumerate() {
            used_ids.insert(format.id.clone());
            formats.insert(format.id.clone(), i);
        }
        for (i, effect) in doc.resources.effects.iter().enumerate() {
            used_ids.insert(effect.id.clone());
            effects.insert(effect.id.clone(), i);
        }
        for (i, m) in doc.resources.media.iter().enumerate() {
            used_ids.insert(m.id.clone());
            media.insert(m.id.clone(), i);
        }

        let next_id = doc.resources.count() + 1;
        debug!(existing = doc.resources.count(), next_id, "registry initialized");

        ResourceRegistry {
            inner: Mutex::new(Inner {
                doc,
                used_ids,
                assets,
                formats,
                effects,
                media,
                next_id,
                uid_cache: HashMap::new(),
            }),
        }
    }

    /// Reserve `count` unused IDs, marking each used before returning.
    ///
    /// The counter advances past any ID already present in the document,
    /// so non-contiguous or externally assigned IDs are skipped rather
    /// than collided with. Reservation never fails.
    pub fn reserve_ids(&self, count: usize) -> Vec<String> {
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        let mut reserved = Vec::with_capacity(count);
        for _ in 0..count {
            loop {
                let id = ids::resource_id(inner.next_id);
                inner.next_id += 1;
                if !inner.used_ids.contains(&id) {
                    inner.used_ids.insert(id.clone());
                    reserved.push(id);
                    break;
                }
            }
        }
        debug!(?reserved, "reserved resource ids");
        reserved
    }

    /// Reserve a single ID.
    pub fn reserve_next_id(&self) -> String {
        self.reserve_ids(1).remove(0)
    }

    /// Register a committed asset into the document and the typed map.
    pub fn register_asset(&self, asset: Asset) {
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        inner.used_ids.insert(asset.id.clone());
        let idx = inner.doc.resources.assets.len();
        inner.assets.insert(asset.id.clone(), idx);
        inner.doc.resources.assets.push(asset);
    }

    pub fn register_format(&self, format: Format) {
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        inner.used_ids.insert(format.id.clone());
        let idx = inner.doc.resources.formats.len();
        inner.formats.insert(format.id.clone(), idx);
        inner.doc.resources.formats.push(format);
    }

    pub fn register_effect(&self, effect: Effect) {
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        inner.used_ids.insert(effect.id.clone());
        let idx = inner.doc.resources.effects.len();
        inner.effects.insert(effect.id.clone(), idx);
        inner.doc.resources.effects.push(effect);
    }

    pub fn register_media(&self, media: Media) {
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        inner.used_ids.insert(media.id.clone());
        let idx = inner.doc.resources.media.len();
        inner.media.insert(media.id.clone(), idx);
        inner.doc.resources.media.push(media);
    }

    /// Look up an asset by ID.
    pub fn asset(&self, id: &str) -> Option<Asset> {
        let inner = self.inner.lock().expect("registry lock poisoned");
        let idx = *inner.assets.get(id)?;
        inner.doc.resources.assets.get(idx).cloned()
    }

    /// Find an existing asset whose backing file is `path`.
    ///
    /// Compares the fully qualified source locator; used to avoid
    /// creating a duplicate asset when the same file is added twice.
    /// "Not found" is an expected outcome, not an error.
    pub fn find_asset_by_file_path(&self, path: &Path) -> Option<Asset> {
        let inner = self.inner.lock().expect("registry lock poisoned");
        let src = format!("file://{}", path.display());
        inner
            .doc
            .resources
            .assets
            .iter()
            .find(|a| a.media_rep.src == src)
            .cloned()
    }

    /// Find an effect by display name, for create-or-reuse.
    pub fn find_effect_by_name(&self, name: &str) -> Option<Effect> {
        let inner = self.inner.lock().expect("registry lock poisoned");
        inner
            .doc
            .resources
            .effects
            .iter()
            .find(|e| e.name == name)
            .cloned()
    }

    /// Find a format by profile name, for create-or-reuse.
    pub fn find_format_by_name(&self, name: &str) -> Option<Format> {
        let inner = self.inner.lock().expect("registry lock poisoned");
        inner
            .doc
            .resources
            .formats
            .iter()
            .find(|f| f.name == name)
            .cloned()
    }

    /// Memoized UID derivation for a file name.
    pub fn uid_for(&self, file_name: &str) -> String {
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        if let Some(uid) = inner.uid_cache.get(file_name) {
            return uid.clone();
        }
        let uid = ids::media_uid(file_name);
        inner.uid_cache.insert(file_name.to_string(), uid.clone());
        uid
    }

    /// Total registered resources across all four collections.
    pub fn resource_count(&self) -> usize {
        let inner = self.inner.lock().expect("registry lock poisoned");
        inner.doc.resources.count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Format, Resources};

    fn doc_with_resources(assets: usize, formats: usize) -> Fcpxml {
        let mut resources = Resources::default();
        let mut n = 0;
        for _ in 0..assets {
            n += 1;
            resources.assets.push(Asset {
                id: ids::resource_id(n),
                ..Asset::default()
            });
        }
        for _ in 0..formats {
            n += 1;
            resources.formats.push(Format {
                id: ids::resource_id(n),
                ..Format::default()
            });
        }
        Fcpxml {
            version: "1.13".into(),
            resources,
            ..Fcpxml::default()
        }
    }

    #[test]
    fn test_counter_starts_past_existing_resources() {
        let mut doc = doc_with_resources(2, 1);
        let registry = ResourceRegistry::new(&mut doc);
        assert_eq!(registry.reserve_next_id(), "r4");
    }

    #[test]
    fn test_reserve_skips_externally_assigned_ids() {
        // Document holds r1 and r5: the count-based counter would land on
        // r5, which must be skipped, not reissued.
        let mut doc = Fcpxml::default();
        doc.resources.formats.push(Format {
            id: "r1".into(),
            ..Format::default()
        });
        doc.resources.assets.push(Asset {
            id: "r5".into(),
            ..Asset::default()
        });

        let registry = ResourceRegistry::new(&mut doc);
        let ids = registry.reserve_ids(3);
        assert_eq!(ids, vec!["r3", "r4", "r6"]);
    }

    #[test]
    fn test_reserved_ids_are_unique_under_concurrency() {
        let mut doc = doc_with_resources(1, 1);
        let registry = ResourceRegistry::new(&mut doc);

        let mut all = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| registry.reserve_ids(25)))
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect::<Vec<_>>()
        });

        let total = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), total, "concurrent reservation issued a duplicate");
    }

    #[test]
    fn test_register_appends_to_document() {
        let mut doc = doc_with_resources(0, 1);
        {
            let registry = ResourceRegistry::new(&mut doc);
            let id = registry.reserve_next_id();
            registry.register_asset(Asset {
                id: id.clone(),
                name: "clip".into(),
                ..Asset::default()
            });
            assert!(registry.asset(&id).is_some());
            assert_eq!(registry.resource_count(), 2);
        }
        assert_eq!(doc.resources.assets.len(), 1);
        assert_eq!(doc.resources.assets[0].id, "r2");
    }

    #[test]
    fn test_find_asset_by_file_path() {
        let mut doc = Fcpxml::default();
        doc.resources.assets.push(Asset {
            id: "r2".into(),
            media_rep: crate::model::MediaRep {
                src: "file:///media/clip.mov".into(),
                ..crate::model::MediaRep::default()
            },
            ..Asset::default()
        });

        let registry = ResourceRegistry::new(&mut doc);
        assert!(registry
            .find_asset_by_file_path(Path::new("/media/clip.mov"))
            .is_some());
        assert!(registry
            .find_asset_by_file_path(Path::new("/media/other.mov"))
            .is_none());
    }

    #[test]
    fn test_uid_for_is_memoized_and_deterministic() {
        let mut doc = Fcpxml::default();
        let registry = ResourceRegistry::new(&mut doc);
        let a = registry.uid_for("clip.mov");
        let b = registry.uid_for("clip.mov");
        assert_eq!(a, b);
        assert_eq!(a, ids::media_uid("clip.mov"));
    }
}
