/// Open worlds (one per tab) and the views rendered for each
use std::collections::HashMap;
use std::sync::Arc;

use super::frames::FrameCache;
use super::viewer::ViewerState;
use crate::backend::types::ViewConfig;

/// Name of the view every tab starts with
pub const DEFAULT_VIEW: &str = "";
/// View that receives generation progress previews
pub const PIPELINE_VIEW: &str = "pipeline";

/// One world and its rendered views
#[derive(Debug)]
pub struct WorldTab {
    /// Unique for the lifetime of the workspace; names may repeat
    pub id: u64,
    pub name: String,
    /// Views in creation order
    views: Vec<(String, Arc<FrameCache>)>,
    /// Config each spin view was requested with, for refreshing
    configs: HashMap<String, ViewConfig>,
    pub viewer: ViewerState,
}

impl WorldTab {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            views: vec![(DEFAULT_VIEW.to_string(), Arc::new(FrameCache::new()))],
            configs: HashMap::new(),
            viewer: ViewerState::default(),
        }
    }

    /// Create `name` with an empty cache, replacing a view of the same name.
    /// Fetches still writing into the old cache no longer reach the screen.
    pub fn open_view(&mut self, name: &str) -> Arc<FrameCache> {
        let cache = Arc::new(FrameCache::new());
        match self.views.iter_mut().find(|(view, _)| view == name) {
            Some((_, existing)) => *existing = Arc::clone(&cache),
            None => self.views.push((name.to_string(), Arc::clone(&cache))),
        }
        cache
    }

    /// Returns false if there was no such view
    pub fn close_view(&mut self, name: &str) -> bool {
        let before = self.views.len();
        self.views.retain(|(view, _)| view != name);
        if self.views.len() == before {
            return false;
        }
        self.configs.remove(name);
        self.viewer.view_closed(name);
        true
    }

    pub fn view(&self, name: &str) -> Option<&Arc<FrameCache>> {
        self.views
            .iter()
            .find(|(view, _)| view == name)
            .map(|(_, cache)| cache)
    }

    pub fn set_view_config(&mut self, name: &str, config: ViewConfig) {
        self.configs.insert(name.to_string(), config);
    }

    pub fn view_config(&self, name: &str) -> Option<&ViewConfig> {
        self.configs.get(name)
    }

    pub fn view_names(&self) -> Vec<&str> {
        self.views.iter().map(|(view, _)| view.as_str()).collect()
    }

    /// Cache of the view on screen
    pub fn current_cache(&self) -> Option<&Arc<FrameCache>> {
        self.view(&self.viewer.current_view)
    }
}

/// All open tabs
#[derive(Debug, Default)]
pub struct Workspace {
    tabs: Vec<WorldTab>,
    active: usize,
    next_id: u64,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tab for `name` and make it active
    pub fn new_tab(&mut self, name: impl Into<String>) -> &mut WorldTab {
        self.tabs.push(WorldTab::new(self.next_id, name));
        self.next_id += 1;
        self.active = self.tabs.len() - 1;
        &mut self.tabs[self.active]
    }

    /// Drop the tab at `index` together with its frame caches
    pub fn close_tab(&mut self, index: usize) -> Option<WorldTab> {
        if index >= self.tabs.len() {
            return None;
        }
        let tab = self.tabs.remove(index);
        if self.active > index || self.active >= self.tabs.len() {
            self.active = self.active.saturating_sub(1);
        }
        Some(tab)
    }

    pub fn select_tab(&mut self, index: usize) {
        if index < self.tabs.len() {
            self.active = index;
        }
    }

    pub fn active_index(&self) -> Option<usize> {
        (!self.tabs.is_empty()).then_some(self.active)
    }

    pub fn active(&self) -> Option<&WorldTab> {
        self.tabs.get(self.active)
    }

    pub fn active_mut(&mut self) -> Option<&mut WorldTab> {
        self.tabs.get_mut(self.active)
    }

    /// Tab with the given id, if it is still open
    pub fn tab_mut(&mut self, id: u64) -> Option<&mut WorldTab> {
        self.tabs.iter_mut().find(|tab| tab.id == id)
    }

    /// Name of the world in the active tab
    pub fn selected_world(&self) -> Option<&str> {
        self.active().map(|tab| tab.name.as_str())
    }

    pub fn tabs(&self) -> &[WorldTab] {
        &self.tabs
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::forms::NewViewForm;
    use crate::state::frames::Frame;
    use std::path::Path;

    #[test]
    fn test_new_tab_has_empty_default_view() {
        let mut workspace = Workspace::new();
        assert_eq!(workspace.selected_world(), None);

        let tab = workspace.new_tab("earth");
        assert_eq!(tab.view_names(), vec![DEFAULT_VIEW]);
        assert!(tab.view(DEFAULT_VIEW).unwrap().is_empty());
        assert_eq!(workspace.selected_world(), Some("earth"));
    }

    #[test]
    fn test_open_view_replaces_cache() {
        let mut tab = WorldTab::new(0, "earth");
        let first = tab.open_view("globe");
        first.insert(0.0, Frame::default());
        tab.open_view("mercator");

        let second = tab.open_view("globe");
        assert!(second.is_empty());
        assert!(!Arc::ptr_eq(&first, tab.view("globe").unwrap()));
        assert_eq!(tab.view_names(), vec!["", "globe", "mercator"]);
    }

    #[test]
    fn test_close_view_resets_viewer() {
        let mut tab = WorldTab::new(0, "earth");
        tab.open_view("globe");
        let config = NewViewForm::default().to_config(Path::new("out"));
        tab.set_view_config("globe", config);
        assert!(tab.view_config("globe").is_some());
        tab.viewer.select_view("globe", true, (10, 10));

        assert!(tab.close_view("globe"));
        assert!(!tab.close_view("globe"));
        assert!(tab.view_config("globe").is_none());
        assert_eq!(tab.viewer.current_view, DEFAULT_VIEW);
        assert!(tab.current_cache().is_some());
    }

    #[test]
    fn test_close_tab_keeps_selection_sane() {
        let mut workspace = Workspace::new();
        workspace.new_tab("a");
        workspace.new_tab("b");
        workspace.new_tab("c");
        workspace.select_tab(1);

        workspace.close_tab(0);
        assert_eq!(workspace.selected_world(), Some("b"));

        workspace.close_tab(1);
        assert_eq!(workspace.selected_world(), Some("b"));

        assert!(workspace.close_tab(5).is_none());
        assert!(workspace.tab_mut(0).is_none());
        assert_eq!(workspace.tab_mut(1).unwrap().name, "b");
        workspace.close_tab(0);
        assert!(workspace.is_empty());
        assert_eq!(workspace.active_index(), None);
        assert_eq!(workspace.selected_world(), None);
    }

    #[test]
    fn test_closing_tab_drops_caches() {
        let mut workspace = Workspace::new();
        let cache = workspace.new_tab("earth").open_view("globe");
        let weak = Arc::downgrade(&cache);
        drop(cache);

        workspace.close_tab(0);
        assert!(weak.upgrade().is_none());
    }
}
