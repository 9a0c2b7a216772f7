//! Shared test helpers: an in-memory backend standing in for the remote
//! analysis service.

// Not every test crate uses every helper.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;

use choromap_client::assets::FileAsset;
use choromap_client::client::Backend;
use choromap_client::error::{Error, Result};

/// In-memory [`Backend`] with scriptable failures.
///
/// Records every call in `fetch_log` so tests can assert fetch order and
/// sequencing.
#[derive(Default)]
pub struct FakeBackend {
    pub session_id: String,
    pub table_text: Option<String>,
    pub summary: Option<String>,
    pub assets: HashMap<String, Vec<u8>>,
    /// Fail the Nth asset fetch (0-based) regardless of name
    pub fail_asset_at: Option<usize>,
    pub fail_submit: bool,
    pub fetch_log: RefCell<Vec<String>>,
    pub asset_fetches: RefCell<usize>,
}

impl FakeBackend {
    pub fn new(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            ..Self::default()
        }
    }

    pub fn with_asset(mut self, name: &str, bytes: &[u8]) -> Self {
        self.assets.insert(name.to_string(), bytes.to_vec());
        self
    }

    fn log(&self, entry: String) {
        self.fetch_log.borrow_mut().push(entry);
    }
}

impl Backend for FakeBackend {
    async fn submit(&self, files: &[FileAsset]) -> Result<String> {
        self.log(format!("submit({})", files.len()));
        if self.fail_submit {
            return Err(Error::Upload("server rejected upload".to_string()));
        }
        Ok(self.session_id.clone())
    }

    async fn fetch_result_table(&self, session_id: &str) -> Result<String> {
        self.log(format!("table({})", session_id));
        self.table_text
            .clone()
            .ok_or_else(|| Error::ExpiredSession("data.csv returned 404".to_string()))
    }

    async fn fetch_summary(&self, session_id: &str) -> Result<String> {
        self.log(format!("summary({})", session_id));
        self.summary
            .clone()
            .ok_or_else(|| Error::ExpiredSession("summary returned 404".to_string()))
    }

    async fn fetch_asset(&self, session_id: &str, file_name: &str) -> Result<FileAsset> {
        self.log(format!("asset({}, {})", session_id, file_name));
        let index = {
            let mut count = self.asset_fetches.borrow_mut();
            let index = *count;
            *count += 1;
            index
        };
        if self.fail_asset_at == Some(index) {
            return Err(Error::ExpiredSession(format!(
                "asset {} returned 404",
                file_name
            )));
        }
        self.assets
            .get(file_name)
            .map(|bytes| FileAsset::new(file_name, bytes.clone()))
            .ok_or_else(|| Error::ExpiredSession(format!("asset {} returned 404", file_name)))
    }
}

/// All 51 plottable location names (50 states + DC).
pub const STATE_NAMES: [&str; 51] = [
    "Alabama", "Alaska", "Arizona", "Arkansas", "California", "Colorado",
    "Connecticut", "Delaware", "Florida", "Georgia", "Hawaii", "Idaho",
    "Illinois", "Indiana", "Iowa", "Kansas", "Kentucky", "Louisiana",
    "Maine", "Maryland", "Massachusetts", "Michigan", "Minnesota",
    "Mississippi", "Missouri", "Montana", "Nebraska", "Nevada",
    "New Hampshire", "New Jersey", "New Mexico", "New York",
    "North Carolina", "North Dakota", "Ohio", "Oklahoma", "Oregon",
    "Pennsylvania", "Rhode Island", "South Carolina", "South Dakota",
    "Tennessee", "Texas", "Utah", "Vermont", "Virginia", "Washington",
    "West Virginia", "Wisconsin", "Wyoming", "District of Columbia",
];
