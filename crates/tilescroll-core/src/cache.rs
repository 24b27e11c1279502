//! Converted-image cache.
//!
//! Adapters convert their source images to the buffer's pixel format once per
//! buffer allocation. The cache keeps one converted copy per
//! (source image, target format) pair so that switching back to a format
//! already seen costs nothing. It belongs to the adapter and is emptied when
//! the adapter reloads its data.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use tilescroll_types::error::Result;
use tilescroll_types::pixmap::{PixelFormat, Pixmap};

/// Cache of converted images keyed by source name and target format.
pub struct ImageCache<P> {
    entries: RefCell<HashMap<(String, PixelFormat), Rc<P>>>,
    hits: Cell<u64>,
    misses: Cell<u64>,
}

impl<P: Pixmap> ImageCache<P> {
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
            hits: Cell::new(0),
            misses: Cell::new(0),
        }
    }

    /// Return the `format` version of `source`, converting on first use.
    pub fn get_or_convert(&self, key: &str, source: &P, format: PixelFormat) -> Result<Rc<P>> {
        let cache_key = (key.to_string(), format);
        if let Some(found) = self.entries.borrow().get(&cache_key) {
            self.hits.set(self.hits.get() + 1);
            return Ok(Rc::clone(found));
        }
        self.misses.set(self.misses.get() + 1);
        let converted = Rc::new(source.convert(format)?);
        log::debug!("converted image '{key}' to {format:?}");
        self.entries
            .borrow_mut()
            .insert(cache_key, Rc::clone(&converted));
        Ok(converted)
    }

    /// Drop every cached conversion.
    pub fn invalidate(&self) {
        let mut entries = self.entries.borrow_mut();
        if !entries.is_empty() {
            log::debug!("image cache invalidated ({} entries)", entries.len());
        }
        entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// `(hits, misses)` since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits.get(), self.misses.get())
    }
}

impl<P: Pixmap> Default for ImageCache<P> {
    fn default() -> Self {
        Self::new()
    }
}
