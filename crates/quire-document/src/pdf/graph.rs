// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page graph: building fresh output documents and copying pages into them.
//
// A copy never reparents a source page. Every object reachable from the page
// is duplicated into the destination exactly once per destination document:
// the copier keeps a source-id -> destination-id map, so a font or image
// shared by many pages is embedded a single time, and reference cycles
// (annotation /P back-links) terminate.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, warn};

/// Page attributes that may be inherited from ancestors in the page tree
/// (ISO 32000-1 table 30).
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// US Letter, used when a page carries no /MediaBox anywhere in its ancestry.
pub const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// An output document under construction: catalog, one flat page tree node,
/// and the pages appended so far.
pub struct DocumentBuilder {
    document: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
}

impl DocumentBuilder {
    /// Empty document with a catalog and an empty /Pages node.
    pub fn new() -> Self {
        let mut document = Document::with_version("1.7");
        let pages_id = document.new_object_id();
        document.objects.insert(
            pages_id,
            Object::Dictionary(Dictionary::from_iter([
                ("Type", Object::Name(b"Pages".to_vec())),
                ("Kids", Object::Array(Vec::new())),
                ("Count", Object::Integer(0)),
            ])),
        );
        let catalog_id = document.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        document.trailer.set("Root", Object::Reference(catalog_id));

        Self {
            document,
            pages_id,
            page_ids: Vec::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Page object ids in page order.
    pub fn page_ids(&self) -> &[ObjectId] {
        &self.page_ids
    }

    pub fn page_count(&self) -> u32 {
        self.page_ids.len() as u32
    }

    /// Append a page dictionary, setting its /Type and /Parent.
    pub fn add_page(&mut self, mut page: Dictionary) -> ObjectId {
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(self.pages_id));
        let page_id = self.document.add_object(page);
        self.link_page(page_id);
        page_id
    }

    /// Register an already inserted page object as the next page.
    fn link_page(&mut self, page_id: ObjectId) {
        if let Ok(Object::Dictionary(pages)) = self.document.get_object_mut(self.pages_id) {
            if let Ok(Object::Array(kids)) = pages.get_mut(b"Kids") {
                kids.push(Object::Reference(page_id));
            }
            pages.set("Count", Object::Integer(self.page_ids.len() as i64 + 1));
        }
        self.page_ids.push(page_id);
    }

    /// Start copying pages out of `source` into this document.
    pub fn copier<'s>(&mut self, source: &'s Document) -> PageCopier<'s, '_> {
        PageCopier {
            source,
            builder: self,
            id_map: HashMap::new(),
        }
    }

    /// Mutable access to the catalog dictionary.
    pub fn catalog_mut(&mut self) -> Option<&mut Dictionary> {
        let root = self.document.trailer.get(b"Root").ok()?.as_reference().ok()?;
        match self.document.get_object_mut(root) {
            Ok(Object::Dictionary(dict)) => Some(dict),
            _ => None,
        }
    }

    pub fn into_document(self) -> Document {
        self.document
    }
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Copies pages from one source document into one destination builder.
///
/// Keep a single copier alive for all pages taken from the same source so
/// shared resources are deduplicated.
pub struct PageCopier<'s, 't> {
    source: &'s Document,
    builder: &'t mut DocumentBuilder,
    id_map: HashMap<ObjectId, ObjectId>,
}

impl PageCopier<'_, '_> {
    /// Copy the 1-based page `page_number` and append it to the destination.
    pub fn copy_page_number(&mut self, page_number: u32) -> Result<ObjectId, String> {
        let pages = self.source.get_pages();
        let page_id = *pages.get(&page_number).ok_or_else(|| {
            format!(
                "page {page_number} not found (document has {} pages)",
                pages.len()
            )
        })?;
        self.copy_page(page_id)
    }

    /// Copy the page object `page_id` and append it to the destination.
    pub fn copy_page(&mut self, page_id: ObjectId) -> Result<ObjectId, String> {
        let source = self.source;
        let page = source
            .get_dictionary(page_id)
            .map_err(|err| format!("cannot read page object {page_id:?}: {err}"))?;

        // Reserve the destination id first so back-references resolve to it.
        let new_id = self.builder.document.new_object_id();
        self.id_map.insert(page_id, new_id);

        let mut copied = Dictionary::new();
        for (key, value) in page.iter() {
            // /Parent is replaced; /B (article beads) would drag whole threads along.
            if key == b"Parent" || key == b"B" {
                continue;
            }
            copied.set(key.clone(), self.copy_value(value));
        }

        for key in INHERITABLE_KEYS {
            if copied.has(key) {
                continue;
            }
            if let Some(inherited) = inherited_attribute(source, page, key) {
                let value = self.copy_value(inherited);
                copied.set(key.to_vec(), value);
            }
        }
        if !copied.has(b"MediaBox") {
            copied.set("MediaBox", box_to_object(DEFAULT_MEDIA_BOX));
        }

        copied.set("Type", Object::Name(b"Page".to_vec()));
        copied.set("Parent", Object::Reference(self.builder.pages_id));
        self.builder
            .document
            .objects
            .insert(new_id, Object::Dictionary(copied));
        self.builder.link_page(new_id);

        debug!(?page_id, ?new_id, shared = self.id_map.len(), "page copied");
        Ok(new_id)
    }

    /// Number of distinct source objects copied so far.
    pub fn copied_objects(&self) -> usize {
        self.id_map.len()
    }

    fn copy_value(&mut self, value: &Object) -> Object {
        match value {
            Object::Reference(id) => match self.copy_reference(*id) {
                Some(new_id) => Object::Reference(new_id),
                None => Object::Null,
            },
            Object::Array(items) => {
                Object::Array(items.iter().map(|item| self.copy_value(item)).collect())
            }
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dictionary(dict)),
            Object::Stream(stream) => Object::Stream(self.copy_stream(stream)),
            other => other.clone(),
        }
    }

    fn copy_dictionary(&mut self, dict: &Dictionary) -> Dictionary {
        let mut copied = Dictionary::new();
        for (key, value) in dict.iter() {
            copied.set(key.clone(), self.copy_value(value));
        }
        copied
    }

    fn copy_stream(&mut self, stream: &Stream) -> Stream {
        let dict = self.copy_dictionary(&stream.dict);
        let mut copied = Stream::new(dict, stream.content.clone());
        copied.allows_compression = stream.allows_compression;
        copied
    }

    /// Map a source reference to its destination id, copying on first sight.
    ///
    /// References to pages or page-tree nodes that are not themselves being
    /// copied (link destinations, thread beads) become `None`.
    fn copy_reference(&mut self, id: ObjectId) -> Option<ObjectId> {
        if let Some(&existing) = self.id_map.get(&id) {
            return Some(existing);
        }

        let source = self.source;
        let object = match source.get_object(id) {
            Ok(object) => object,
            Err(err) => {
                warn!(?id, %err, "dangling reference replaced with null");
                return None;
            }
        };

        if let Ok(dict) = object.as_dict()
            && matches!(dict.get(b"Type").and_then(Object::as_name), Ok(b"Page" | b"Pages"))
        {
            return None;
        }

        let new_id = self.builder.document.new_object_id();
        self.id_map.insert(id, new_id);
        let copied = self.copy_value(object);
        self.builder.document.objects.insert(new_id, copied);
        Some(new_id)
    }
}

/// Walk up the /Parent chain looking for an inheritable attribute.
fn inherited_attribute<'a>(doc: &'a Document, page: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    let mut node = page;
    // Depth guard against malformed cyclic page trees.
    for _ in 0..64 {
        let parent_id = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent_id).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
    }
    None
}

/// Trailer entries that survive a [`detached_copy`]. /Info is rewritten by
/// every operation, so the source dictionary never carries over.
const KEPT_TRAILER_KEYS: [&[u8]; 2] = [b"Root", b"ID"];

/// A copy of `source` for operations that transform the whole document in
/// place. Only objects, trailer root entries and version are carried over;
/// cross-reference bookkeeping and decryption state stay with the source.
///
/// Unless `keep_metadata` is set the catalog's XMP /Metadata stream is
/// dropped as well. Objects no longer reachable from the trailer are pruned,
/// so neither the old /Info dictionary nor the XMP packet reach the output.
pub fn detached_copy(source: &Document, keep_metadata: bool) -> Document {
    let mut copy = Document::with_version(source.version.clone());
    copy.objects = source.objects.clone();
    copy.max_id = source.max_id;
    for (key, value) in source.trailer.iter() {
        if KEPT_TRAILER_KEYS.contains(&key.as_slice()) {
            copy.trailer.set(key.clone(), value.clone());
        }
    }
    if !keep_metadata && let Ok(catalog) = copy.catalog_mut() {
        catalog.remove(b"Metadata");
    }
    let pruned = copy.prune_objects();
    debug!(pruned = pruned.len(), keep_metadata, "detached copy made");
    copy
}

/// Follow references until a direct object is reached.
pub fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    let mut current = object;
    for _ in 0..32 {
        match current {
            Object::Reference(id) => match doc.get_object(*id) {
                Ok(next) => current = next,
                Err(_) => return &Object::Null,
            },
            _ => return current,
        }
    }
    current
}

/// Numeric value of an integer or real object.
pub fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

pub fn box_to_object(rect: [f32; 4]) -> Object {
    Object::Array(rect.iter().map(|v| Object::Real((*v).into())).collect())
}

/// Visible page rectangle `[llx, lly, urx, ury]`: the /CropBox if present,
/// else the /MediaBox, normalised so `ll < ur`.
pub fn page_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    let Ok(page) = doc.get_dictionary(page_id) else {
        return DEFAULT_MEDIA_BOX;
    };

    let read_box = |key: &[u8]| -> Option<[f32; 4]> {
        let value = page
            .get(key)
            .ok()
            .or_else(|| inherited_attribute(doc, page, key))?;
        let items = resolve(doc, value).as_array().ok()?;
        if items.len() != 4 {
            return None;
        }
        let mut rect = [0.0f32; 4];
        for (slot, item) in rect.iter_mut().zip(items) {
            *slot = number(resolve(doc, item))?;
        }
        Some([
            rect[0].min(rect[2]),
            rect[1].min(rect[3]),
            rect[0].max(rect[2]),
            rect[1].max(rect[3]),
        ])
    };

    read_box(b"CropBox")
        .or_else(|| read_box(b"MediaBox"))
        .unwrap_or(DEFAULT_MEDIA_BOX)
}

/// Wrap a page's existing content in `prefix ... suffix` streams.
///
/// Used to isolate existing drawing in `q ... Q` before appending new
/// content on top of it.
pub fn wrap_page_content(
    doc: &mut Document,
    page_id: ObjectId,
    prefix: Vec<u8>,
    suffix: Vec<u8>,
) -> Result<(), String> {
    let prefix_id = doc.add_object(Stream::new(Dictionary::new(), prefix));
    let suffix_id = doc.add_object(Stream::new(Dictionary::new(), suffix));

    let page = doc
        .get_dictionary_mut(page_id)
        .map_err(|err| format!("cannot read page {page_id:?}: {err}"))?;

    let mut contents = vec![Object::Reference(prefix_id)];
    match page.get(b"Contents") {
        Ok(Object::Reference(id)) => contents.push(Object::Reference(*id)),
        Ok(Object::Array(existing)) => contents.extend(existing.iter().cloned()),
        _ => {}
    }
    contents.push(Object::Reference(suffix_id));
    page.set("Contents", Object::Array(contents));
    Ok(())
}

/// Register `object` under `/Resources/<category>/<name>` on a page.
///
/// Handles resource dictionaries that are inline, indirect, or shared
/// between pages; a shared dictionary simply gains the same entry once.
pub fn add_page_resource(
    doc: &mut Document,
    page_id: ObjectId,
    category: &str,
    name: &str,
    object: Object,
) -> Result<(), String> {
    // Resources inherited from the page tree are pinned onto the page first,
    // otherwise the new entry would hide them.
    let inherited = {
        let page = doc
            .get_dictionary(page_id)
            .map_err(|err| format!("cannot read page {page_id:?}: {err}"))?;
        if page.has(b"Resources") {
            None
        } else {
            inherited_attribute(doc, page, b"Resources").cloned()
        }
    };

    // Locate the resources dictionary, promoting a missing one to inline.
    let resources_ref = {
        let page = doc
            .get_dictionary_mut(page_id)
            .map_err(|err| format!("cannot read page {page_id:?}: {err}"))?;
        if let Some(inherited) = inherited {
            page.set("Resources", inherited);
        }
        let existing = match page.get(b"Resources") {
            Ok(Object::Reference(id)) => Some(Some(*id)),
            Ok(Object::Dictionary(_)) => Some(None),
            _ => None,
        };
        existing.unwrap_or_else(|| {
            page.set("Resources", Object::Dictionary(Dictionary::new()));
            None
        })
    };

    // Same dance one level down for the category dictionary.
    let category_ref = {
        let resources = resources_dict_mut(doc, page_id, resources_ref)?;
        let existing = match resources.get(category.as_bytes()) {
            Ok(Object::Reference(id)) => Some(Some(*id)),
            Ok(Object::Dictionary(_)) => Some(None),
            _ => None,
        };
        existing.unwrap_or_else(|| {
            resources.set(category, Object::Dictionary(Dictionary::new()));
            None
        })
    };

    let target = match category_ref {
        Some(id) => doc
            .get_dictionary_mut(id)
            .map_err(|err| format!("cannot read /{category} dictionary: {err}"))?,
        None => {
            let resources = resources_dict_mut(doc, page_id, resources_ref)?;
            match resources.get_mut(category.as_bytes()) {
                Ok(Object::Dictionary(dict)) => dict,
                _ => return Err(format!("/{category} is not a dictionary")),
            }
        }
    };
    target.set(name, object);
    Ok(())
}

fn resources_dict_mut(
    doc: &mut Document,
    page_id: ObjectId,
    resources_ref: Option<ObjectId>,
) -> Result<&mut Dictionary, String> {
    match resources_ref {
        Some(id) => doc
            .get_dictionary_mut(id)
            .map_err(|err| format!("cannot read /Resources: {err}")),
        None => {
            let page = doc
                .get_dictionary_mut(page_id)
                .map_err(|err| format!("cannot read page {page_id:?}: {err}"))?;
            match page.get_mut(b"Resources") {
                Ok(Object::Dictionary(dict)) => Ok(dict),
                _ => Err("/Resources is not a dictionary".to_string()),
            }
        }
    }
}
