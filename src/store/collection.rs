use std::path::Path;

use super::error::{StoreError, StoreResult};
use super::model::{next_widget_id, Overlay, Widget, WidgetKind};
use crate::color::Rgba;
use crate::geometry::WidgetPosition;

/// Owned overlay collection with a single active selection.
///
/// Every mutation is local until the session saves it; a reload replaces the
/// whole collection and drops anything unsaved.
#[derive(Debug, Default)]
pub struct OverlayStore {
    overlays: Vec<Overlay>,
    selected: Option<usize>,
    unsaved_changes: bool,
}

impl OverlayStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overlays(overlays: Vec<Overlay>) -> Self {
        let mut store = Self::default();
        store.replace_all(overlays);
        store
    }

    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    pub fn overlay(&self, index: usize) -> Option<&Overlay> {
        self.overlays.get(index)
    }

    pub fn overlay_index(&self, name: &str) -> Option<usize> {
        self.overlays.iter().position(|overlay| overlay.name == name)
    }

    /// Labels for the overlay picker, in collection order.
    pub fn overlay_names(&self) -> Vec<&str> {
        self.overlays
            .iter()
            .map(|overlay| overlay.name.as_str())
            .collect()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected(&self) -> Option<&Overlay> {
        self.selected.and_then(|index| self.overlays.get(index))
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved_changes
    }

    /// Makes the overlay at `index` active. An empty collection, or an index
    /// past the end, leaves nothing selected.
    pub fn select_overlay(&mut self, index: usize) -> Option<usize> {
        self.selected = (index < self.overlays.len()).then_some(index);
        tracing::debug!(requested = index, selected = ?self.selected, "select overlay");
        self.selected
    }

    /// Selects the last overlay called `name`; returns whether one exists.
    /// Renames can leave duplicates behind.
    pub fn select_named(&mut self, name: &str) -> bool {
        match self.overlays.iter().rposition(|overlay| overlay.name == name) {
            Some(index) => {
                self.select_overlay(index);
                true
            }
            None => false,
        }
    }

    /// Swaps in a freshly loaded collection. The selection index is kept only
    /// while it still points inside the new collection.
    pub fn replace_all(&mut self, overlays: Vec<Overlay>) {
        tracing::debug!(count = overlays.len(), "replace overlay collection");
        self.overlays = overlays;
        self.selected = self.selected.filter(|index| *index < self.overlays.len());
        self.unsaved_changes = false;
    }

    /// Stages a new empty overlay and returns its index.
    pub fn create_overlay(&mut self, name: &str) -> StoreResult<usize> {
        if name.is_empty() {
            return Err(StoreError::EmptyName);
        }
        if self.overlay_index(name).is_some() {
            tracing::warn!(name, "overlay name already taken");
            return Err(StoreError::DuplicateName {
                name: name.to_string(),
            });
        }

        self.overlays.push(Overlay::new(name));
        self.unsaved_changes = true;
        Ok(self.overlays.len() - 1)
    }

    /// Renames in place. Uniqueness is only checked on creation.
    pub fn rename_overlay(&mut self, index: usize, new_name: impl Into<String>) -> StoreResult<()> {
        let overlay = self.overlay_mut(index)?;
        overlay.name = new_name.into();
        self.unsaved_changes = true;
        Ok(())
    }

    /// Removes an overlay. A selection on it is cleared; a selection after it
    /// moves down with the collection.
    pub fn delete_overlay(&mut self, index: usize) -> StoreResult<Overlay> {
        if index >= self.overlays.len() {
            return Err(StoreError::UnknownOverlay { index });
        }

        let removed = self.overlays.remove(index);
        self.selected = match self.selected {
            Some(selected) if selected == index => None,
            Some(selected) if selected > index => Some(selected - 1),
            other => other,
        };
        self.unsaved_changes = true;
        Ok(removed)
    }

    /// Appends a default widget and returns its id.
    pub fn add_widget(&mut self, index: usize, kind: WidgetKind) -> StoreResult<String> {
        let overlay = self.overlay_mut(index)?;
        let mut id = next_widget_id();
        while overlay.contains_widget(&id) {
            id = next_widget_id();
        }

        overlay.widgets.push(Widget::new(id.clone(), kind));
        tracing::debug!(overlay = %overlay.name, widget_id = %id, %kind, "add widget");
        self.unsaved_changes = true;
        Ok(id)
    }

    pub fn update_widget_content(
        &mut self,
        index: usize,
        widget_id: &str,
        content: impl Into<String>,
    ) -> StoreResult<()> {
        self.widget_mut(index, widget_id)?.content = content.into();
        Ok(())
    }

    pub fn update_widget_position(
        &mut self,
        index: usize,
        widget_id: &str,
        position: WidgetPosition,
    ) -> StoreResult<()> {
        self.widget_mut(index, widget_id)?.position = position;
        Ok(())
    }

    pub fn update_widget_color(
        &mut self,
        index: usize,
        widget_id: &str,
        color: Rgba,
    ) -> StoreResult<()> {
        self.widget_mut(index, widget_id)?.color = color;
        Ok(())
    }

    pub fn update_widget_bg_color(
        &mut self,
        index: usize,
        widget_id: &str,
        color: Rgba,
    ) -> StoreResult<()> {
        self.widget_mut(index, widget_id)?.bg_color = color;
        Ok(())
    }

    /// Stores a picked image path, relative to `<overlay_root>/<overlay name>/`
    /// when the file lives there and absolute otherwise.
    pub fn set_image_content(
        &mut self,
        index: usize,
        widget_id: &str,
        picked: &Path,
        overlay_root: &Path,
    ) -> StoreResult<()> {
        let overlay_dir = overlay_root.join(&self.overlay_mut(index)?.name);
        let content = picked
            .strip_prefix(&overlay_dir)
            .unwrap_or(picked)
            .to_string_lossy()
            .into_owned();
        self.update_widget_content(index, widget_id, content)
    }

    /// Removes the widget with `widget_id`; returns whether one was removed.
    pub fn delete_widget(&mut self, index: usize, widget_id: &str) -> StoreResult<bool> {
        let overlay = self.overlay_mut(index)?;
        let before = overlay.widgets.len();
        overlay.widgets.retain(|widget| widget.id != widget_id);
        let removed = overlay.widgets.len() != before;
        if removed {
            self.unsaved_changes = true;
        }
        Ok(removed)
    }

    fn overlay_mut(&mut self, index: usize) -> StoreResult<&mut Overlay> {
        self.overlays
            .get_mut(index)
            .ok_or(StoreError::UnknownOverlay { index })
    }

    fn widget_mut(&mut self, index: usize, widget_id: &str) -> StoreResult<&mut Widget> {
        let overlay = self
            .overlays
            .get_mut(index)
            .ok_or(StoreError::UnknownOverlay { index })?;
        let widget = overlay
            .widgets
            .iter_mut()
            .find(|widget| widget.id == widget_id)
            .ok_or_else(|| StoreError::UnknownWidget {
                overlay: overlay.name.clone(),
                widget_id: widget_id.to_string(),
            })?;
        self.unsaved_changes = true;
        Ok(widget)
    }
}
