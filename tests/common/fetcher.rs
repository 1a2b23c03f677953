use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use haven_wp::importer::{FetchError, MediaFetcher};

/// Serves the body `payload:{url}` for every URL except those marked as failing.
///
/// Clones share the same call log, so a test can keep one handle while the
/// media cache owns the other.
#[derive(Clone, Default)]
pub struct CountingFetcher {
    calls: Rc<RefCell<HashMap<String, usize>>>,
    failing: Rc<RefCell<Vec<String>>>,
}

impl CountingFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every URL containing `fragment` fail with a 404
    pub fn failing(self, fragment: &str) -> Self {
        self.failing.borrow_mut().push(fragment.to_string());
        self
    }

    /// Number of fetches issued for `url`
    pub fn calls_for(&self, url: &str) -> usize {
        self.calls.borrow().get(url).copied().unwrap_or(0)
    }

    /// Number of fetches issued in total
    pub fn total_calls(&self) -> usize {
        self.calls.borrow().values().sum()
    }
}

impl MediaFetcher for CountingFetcher {
    fn fetch(&self, url: &str, sink: &mut dyn Write) -> Result<u64, FetchError> {
        *self.calls.borrow_mut().entry(url.to_string()).or_insert(0) += 1;
        if self.failing.borrow().iter().any(|f| url.contains(f.as_str())) {
            return Err(FetchError::Unavailable("HTTP status 404".to_string()));
        }
        let body = format!("payload:{}", url);
        sink.write_all(body.as_bytes())?;
        Ok(body.len() as u64)
    }
}
