use std::collections::HashSet;

use crate::schemas::FileRecord;
use crate::services::batch_grading::NO_STUDENTS_SELECTED;
use crate::services::errors::ClientError;

/// Student files listed for an assignment and which of them are picked.
#[derive(Debug, Clone, Default)]
pub struct FileSelection {
    files: Vec<FileRecord>,
    selected: HashSet<String>,
}

impl FileSelection {
    pub fn new(files: Vec<FileRecord>) -> Self {
        Self { files, selected: HashSet::new() }
    }

    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    /// Flips one row. Unknown ids are ignored. Returns the row's new state.
    pub fn toggle(&mut self, id: &str) -> bool {
        if !self.files.iter().any(|file| file.id == id) {
            return false;
        }
        if self.selected.remove(id) {
            false
        } else {
            self.selected.insert(id.to_string());
            true
        }
    }

    /// Clears everything when every row is already selected, otherwise
    /// selects every row.
    pub fn toggle_all(&mut self) {
        if self.all_selected() {
            self.selected.clear();
        } else {
            self.selected = self.files.iter().map(|file| file.id.clone()).collect();
        }
    }

    pub fn all_selected(&self) -> bool {
        !self.files.is_empty() && self.files.iter().all(|file| self.selected.contains(&file.id))
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Selected ids in list order.
    pub fn selected_ids(&self) -> Vec<String> {
        self.files
            .iter()
            .filter(|file| self.selected.contains(&file.id))
            .map(|file| file.id.clone())
            .collect()
    }

    pub fn ensure_non_empty(&self) -> Result<Vec<String>, ClientError> {
        let ids = self.selected_ids();
        if ids.is_empty() {
            return Err(ClientError::MissingInput(NO_STUDENTS_SELECTED));
        }
        Ok(ids)
    }
}
