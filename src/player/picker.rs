//! File picker dialog for adding audio files to the catalog.
//!
//! This is the in-terminal stand-in for a system file chooser: a modal
//! directory browser that lists sub-directories and supported audio files.
//! Choosing a file yields its path and display name; escaping yields
//! [`PickerOutcome::Cancelled`] and leaves the catalog untouched.

use apem_player::constants::is_supported_audio_file;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub enum PickerOutcome {
    Cancelled,
    Picked { path: PathBuf, display_name: String },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickerItemKind {
    Parent,
    Directory,
    AudioFile,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PickerItem {
    pub name: String,
    pub kind: PickerItemKind,
}

#[derive(Clone)]
pub struct FilePicker {
    pub current_path: PathBuf,
    pub items: Vec<PickerItem>,
    pub selected_index: usize,
}

impl FilePicker {
    pub fn new(initial_path: PathBuf) -> Self {
        let current_path = if initial_path.is_dir() {
            // Relative paths would run out of parents before reaching the root
            std::path::absolute(&initial_path).unwrap_or(initial_path)
        } else {
            log::warn!(
                "Picker start directory {} is not a directory, using current directory",
                initial_path.display()
            );
            std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"))
        };

        let mut picker = Self {
            current_path,
            items: Vec::new(),
            selected_index: 0,
        };
        picker.refresh();
        picker
    }

    pub fn refresh(&mut self) {
        self.items.clear();

        let mut directories = Vec::new();
        let mut files = Vec::new();

        if let Ok(entries) = fs::read_dir(&self.current_path) {
            for entry in entries.flatten() {
                let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                    continue;
                };
                // Skip hidden entries
                if name.starts_with('.') {
                    continue;
                }
                let path = entry.path();
                if path.is_dir() {
                    directories.push(name);
                } else if is_supported_audio_file(&path) {
                    files.push(name);
                }
            }
        } else {
            log::warn!("Could not read directory {}", self.current_path.display());
        }

        directories.sort();
        files.sort();

        if self.current_path.parent().is_some() {
            self.items.push(PickerItem {
                name: "..".to_string(),
                kind: PickerItemKind::Parent,
            });
        }
        self.items.extend(directories.into_iter().map(|name| PickerItem {
            name,
            kind: PickerItemKind::Directory,
        }));
        self.items.extend(files.into_iter().map(|name| PickerItem {
            name,
            kind: PickerItemKind::AudioFile,
        }));

        self.selected_index = 0;
    }

    pub fn navigate_up(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
    }

    pub fn navigate_down(&mut self) {
        if self.selected_index < self.items.len().saturating_sub(1) {
            self.selected_index += 1;
        }
    }

    pub fn selected_item(&self) -> Option<&PickerItem> {
        self.items.get(self.selected_index)
    }

    /// Enters the highlighted directory, or picks the highlighted file.
    pub fn activate(&mut self) -> Option<PickerOutcome> {
        let item = self.selected_item()?.clone();

        match item.kind {
            PickerItemKind::Parent => {
                if let Some(parent) = self.current_path.parent() {
                    self.current_path = parent.to_path_buf();
                }
                self.refresh();
                None
            }
            PickerItemKind::Directory => {
                self.current_path = self.current_path.join(&item.name);
                self.refresh();
                None
            }
            PickerItemKind::AudioFile => Some(PickerOutcome::Picked {
                path: self.current_path.join(&item.name),
                display_name: item.name,
            }),
        }
    }

    pub fn cancel(&self) -> PickerOutcome {
        PickerOutcome::Cancelled
    }

    pub fn current_dir(&self) -> &Path {
        &self.current_path
    }
}
