//! Link Manager for LaterList.
//!
//! Implements `LinkManagerTrait`: every state-changing operation on the
//! in-memory document (tabs, containers, links, trash, merge/replace).
//! Each operation resolves all of its ids before touching anything, so a
//! failed call leaves the document exactly as it was.

use std::collections::HashSet;

use log::{debug, warn};

use crate::services::id_generator::{new_id, IdKind};
use crate::services::merge_engine::merge;
use crate::services::validation::check_document;
use crate::types::command::{Command, CommandOutcome};
use crate::types::document::{ActiveView, Container, Document, Link, Tab};
use crate::types::errors::LinkError;

/// Trait defining the document mutation interface.
pub trait LinkManagerTrait {
    fn add_tab(&mut self, name: &str) -> Result<String, LinkError>;
    fn delete_tab(&mut self, tab_id: &str) -> Result<(), LinkError>;
    fn rename_tab(&mut self, tab_id: &str, name: &str) -> Result<(), LinkError>;
    fn switch_tab(&mut self, tab_id: &str) -> Result<(), LinkError>;
    fn show_trash(&mut self);
    fn add_container(&mut self, tab_id: &str, name: &str) -> Result<String, LinkError>;
    fn rename_container(&mut self, container_id: &str, name: &str) -> Result<(), LinkError>;
    fn delete_container(&mut self, container_id: &str) -> Result<(), LinkError>;
    fn move_container(
        &mut self,
        container_id: &str,
        from_tab_id: &str,
        to_tab_id: &str,
        new_order: &[String],
    ) -> Result<(), LinkError>;
    fn trash_all_in_container(&mut self, container_id: &str) -> Result<usize, LinkError>;
    fn add_link(&mut self, tab_id: &str, container_id: &str, url: &str, title: &str) -> Result<String, LinkError>;
    fn delete_link(&mut self, link_id: &str) -> Result<(), LinkError>;
    fn move_to_trash(&mut self, link_id: &str) -> Result<(), LinkError>;
    fn restore_from_trash(&mut self, link_id: &str) -> Result<String, LinkError>;
    fn permanent_delete(&mut self, link_id: &str) -> Result<(), LinkError>;
    fn empty_trash(&mut self) -> usize;
    fn move_link(
        &mut self,
        link_id: &str,
        from_tab_id: &str,
        from_container_id: &str,
        to_tab_id: &str,
        to_container_id: &str,
        dest_index: usize,
    ) -> Result<(), LinkError>;
    fn import_links(&mut self, tab_id: &str, container_name: &str, links: Vec<Link>) -> Result<Option<String>, LinkError>;
    fn replace_document(&mut self, document: Document) -> Result<(), LinkError>;
    fn merge_document(&mut self, incoming: &Document) -> Result<bool, LinkError>;
    fn dispatch(&mut self, command: Command) -> Result<CommandOutcome, LinkError>;
}

/// In-memory owner of the document and the session's active view.
pub struct LinkManager {
    document: Document,
    active: ActiveView,
    restored_container_name: String,
}

impl LinkManager {
    /// Creates a manager over `document`.
    ///
    /// A document without tabs gets the seed tabs (its trash is kept), and an
    /// active view that no longer resolves falls back to the first tab.
    pub fn new(mut document: Document, active: Option<ActiveView>, restored_container_name: &str) -> Self {
        if document.tabs.is_empty() {
            warn!("document has no tabs; restoring the default tabs");
            document.tabs = Document::seed().tabs;
        }
        let active = active.unwrap_or_else(|| ActiveView::Tab(document.tabs[0].id.clone()));
        let mut manager = Self {
            document,
            active,
            restored_container_name: restored_container_name.to_string(),
        };
        manager.ensure_active_view();
        manager
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn active_view(&self) -> &ActiveView {
        &self.active
    }

    /// The active tab, or `TabNotFound` while the trash view is showing.
    pub fn active_tab(&self) -> Result<&Tab, LinkError> {
        let id = self
            .active
            .tab_id()
            .ok_or_else(|| LinkError::TabNotFound(ActiveView::TRASH_SENTINEL.to_string()))?;
        self.find_tab(id)
    }

    pub fn find_tab(&self, tab_id: &str) -> Result<&Tab, LinkError> {
        self.document
            .find_tab(tab_id)
            .ok_or_else(|| LinkError::TabNotFound(tab_id.to_string()))
    }

    pub fn find_container(&self, tab_id: &str, container_id: &str) -> Result<&Container, LinkError> {
        self.find_tab(tab_id)?
            .find_container(container_id)
            .ok_or_else(|| LinkError::ContainerNotFound(container_id.to_string()))
    }

    pub fn find_link(&self, tab_id: &str, container_id: &str, link_id: &str) -> Result<&Link, LinkError> {
        self.find_container(tab_id, container_id)?
            .find_link(link_id)
            .ok_or_else(|| LinkError::LinkNotFound(link_id.to_string()))
    }

    pub fn total_links(&self) -> usize {
        self.document.total_links()
    }

    pub fn total_links_in_tab(&self, tab_id: &str) -> Result<usize, LinkError> {
        self.document
            .total_links_in_tab(tab_id)
            .ok_or_else(|| LinkError::TabNotFound(tab_id.to_string()))
    }

    /// Swaps in a document that changed elsewhere, keeping the view if it still resolves.
    pub fn replace_from_remote(&mut self, document: Document) {
        if document.tabs.is_empty() {
            warn!("ignoring remote document without tabs");
            return;
        }
        self.document = document;
        self.ensure_active_view();
    }

    fn ensure_active_view(&mut self) {
        if let ActiveView::Tab(id) = &self.active {
            if self.document.find_tab(id).is_none() {
                self.active = ActiveView::Tab(self.document.tabs[0].id.clone());
            }
        }
    }

    fn clean_name(name: &str) -> Result<String, LinkError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LinkError::EmptyName);
        }
        Ok(name.to_string())
    }

    /// Index of the active tab; container and link lookups are scoped to it.
    fn active_tab_index(&self, missing: LinkError) -> Result<usize, LinkError> {
        self.active
            .tab_id()
            .and_then(|id| self.document.tab_index(id))
            .ok_or(missing)
    }

    /// `(tab index, container index)` of a container inside the active tab.
    fn locate_active_container(&self, container_id: &str) -> Result<(usize, usize), LinkError> {
        let missing = || LinkError::ContainerNotFound(container_id.to_string());
        let ti = self.active_tab_index(missing())?;
        let ci = self.document.tabs[ti].container_index(container_id).ok_or_else(missing)?;
        Ok((ti, ci))
    }

    /// `(tab, container, link)` indices of a link inside the active tab.
    fn locate_active_link(&self, link_id: &str) -> Result<(usize, usize, usize), LinkError> {
        let missing = || LinkError::LinkNotFound(link_id.to_string());
        let ti = self.active_tab_index(missing())?;
        let (ci, li) = self.document.tabs[ti].locate_link(link_id).ok_or_else(missing)?;
        Ok((ti, ci, li))
    }
}

impl LinkManagerTrait for LinkManager {
    /// Appends a new empty tab and makes it active. Returns its id.
    fn add_tab(&mut self, name: &str) -> Result<String, LinkError> {
        let name = Self::clean_name(name)?;
        let id = new_id(IdKind::Tab);
        self.document.tabs.push(Tab {
            id: id.clone(),
            name,
            containers: Vec::new(),
        });
        self.active = ActiveView::Tab(id.clone());
        Ok(id)
    }

    /// Removes a tab. The last remaining tab is protected.
    fn delete_tab(&mut self, tab_id: &str) -> Result<(), LinkError> {
        let index = self
            .document
            .tab_index(tab_id)
            .ok_or_else(|| LinkError::TabNotFound(tab_id.to_string()))?;
        if self.document.tabs.len() == 1 {
            return Err(LinkError::LastTabProtected(tab_id.to_string()));
        }

        self.document.tabs.remove(index);
        if self.active.tab_id() == Some(tab_id) {
            self.active = ActiveView::Tab(self.document.tabs[0].id.clone());
        }
        Ok(())
    }

    fn rename_tab(&mut self, tab_id: &str, name: &str) -> Result<(), LinkError> {
        let name = Self::clean_name(name)?;
        let tab = self
            .document
            .find_tab_mut(tab_id)
            .ok_or_else(|| LinkError::TabNotFound(tab_id.to_string()))?;
        tab.name = name;
        Ok(())
    }

    fn switch_tab(&mut self, tab_id: &str) -> Result<(), LinkError> {
        self.find_tab(tab_id)?;
        self.active = ActiveView::Tab(tab_id.to_string());
        Ok(())
    }

    fn show_trash(&mut self) {
        self.active = ActiveView::Trash;
    }

    /// Appends a new empty container to the given tab. Returns its id.
    fn add_container(&mut self, tab_id: &str, name: &str) -> Result<String, LinkError> {
        let name = Self::clean_name(name)?;
        let tab = self
            .document
            .find_tab_mut(tab_id)
            .ok_or_else(|| LinkError::TabNotFound(tab_id.to_string()))?;
        let id = new_id(IdKind::Container);
        tab.containers.push(Container {
            id: id.clone(),
            name,
            links: Vec::new(),
        });
        Ok(id)
    }

    /// Renames a container of the active tab.
    fn rename_container(&mut self, container_id: &str, name: &str) -> Result<(), LinkError> {
        let name = Self::clean_name(name)?;
        let (ti, ci) = self.locate_active_container(container_id)?;
        self.document.tabs[ti].containers[ci].name = name;
        Ok(())
    }

    /// Moves every link of an active-tab container to the trash, then removes the container.
    fn delete_container(&mut self, container_id: &str) -> Result<(), LinkError> {
        let (ti, ci) = self.locate_active_container(container_id)?;
        let container = self.document.tabs[ti].containers.remove(ci);
        self.document.trash.extend(container.links);
        Ok(())
    }

    /// Rebuilds the destination tab's container list to follow `new_order`.
    ///
    /// Each listed container is taken from whichever tab holds it. Containers
    /// already in the destination but absent from `new_order` are kept after
    /// the ordered ones.
    fn move_container(
        &mut self,
        container_id: &str,
        from_tab_id: &str,
        to_tab_id: &str,
        new_order: &[String],
    ) -> Result<(), LinkError> {
        self.find_container(from_tab_id, container_id)?;
        self.find_tab(to_tab_id)?;
        if let Some(missing) = new_order.iter().find(|id| self.document.locate_container(id).is_none()) {
            return Err(LinkError::ContainerNotFound(missing.clone()));
        }

        let mut taken = HashSet::new();
        let mut ordered = Vec::with_capacity(new_order.len());
        for id in new_order {
            if !taken.insert(id.as_str()) {
                continue;
            }
            if let Some((ti, ci)) = self.document.locate_container(id) {
                ordered.push(self.document.tabs[ti].containers.remove(ci));
            }
        }

        let dest = self
            .document
            .find_tab_mut(to_tab_id)
            .ok_or_else(|| LinkError::TabNotFound(to_tab_id.to_string()))?;
        let leftovers = std::mem::take(&mut dest.containers);
        if !leftovers.is_empty() {
            debug!("move_container: {} container(s) not named in new order kept at the end", leftovers.len());
        }
        ordered.extend(leftovers);
        dest.containers = ordered;
        Ok(())
    }

    /// Moves all links of a container to the trash; the container stays.
    fn trash_all_in_container(&mut self, container_id: &str) -> Result<usize, LinkError> {
        let (ti, ci) = self
            .document
            .locate_container(container_id)
            .ok_or_else(|| LinkError::ContainerNotFound(container_id.to_string()))?;
        let links = std::mem::take(&mut self.document.tabs[ti].containers[ci].links);
        let count = links.len();
        self.document.trash.extend(links);
        Ok(count)
    }

    /// Appends a link to a container. A blank title falls back to the url.
    fn add_link(&mut self, tab_id: &str, container_id: &str, url: &str, title: &str) -> Result<String, LinkError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(LinkError::Validation("link url must not be empty".to_string()));
        }
        self.find_container(tab_id, container_id)?;

        let id = new_id(IdKind::Link);
        let link = Link::new(id.clone(), title, url);
        if let Some(container) = self
            .document
            .find_tab_mut(tab_id)
            .and_then(|t| t.find_container_mut(container_id))
        {
            container.links.push(link);
        }
        Ok(id)
    }

    /// Removes a link of the active tab without trashing it.
    fn delete_link(&mut self, link_id: &str) -> Result<(), LinkError> {
        let (ti, ci, li) = self.locate_active_link(link_id)?;
        self.document.tabs[ti].containers[ci].links.remove(li);
        Ok(())
    }

    fn move_to_trash(&mut self, link_id: &str) -> Result<(), LinkError> {
        let (ti, ci, li) = self.locate_active_link(link_id)?;
        let link = self.document.tabs[ti].containers[ci].links.remove(li);
        self.document.trash.push(link);
        Ok(())
    }

    /// Returns a trashed link to the first container of the first tab,
    /// creating the restore container when that tab has none.
    /// Returns the id of the receiving container.
    fn restore_from_trash(&mut self, link_id: &str) -> Result<String, LinkError> {
        let index = self
            .document
            .trash_index(link_id)
            .ok_or_else(|| LinkError::LinkNotFound(link_id.to_string()))?;
        let link = self.document.trash.remove(index);

        let first = &mut self.document.tabs[0];
        if first.containers.is_empty() {
            first.containers.push(Container {
                id: new_id(IdKind::Container),
                name: self.restored_container_name.clone(),
                links: Vec::new(),
            });
        }
        let container = &mut first.containers[0];
        container.links.push(link);
        Ok(container.id.clone())
    }

    fn permanent_delete(&mut self, link_id: &str) -> Result<(), LinkError> {
        let index = self
            .document
            .trash_index(link_id)
            .ok_or_else(|| LinkError::LinkNotFound(link_id.to_string()))?;
        self.document.trash.remove(index);
        Ok(())
    }

    /// Clears the trash. Returns how many links were dropped.
    fn empty_trash(&mut self) -> usize {
        let count = self.document.trash.len();
        self.document.trash.clear();
        count
    }

    /// Moves a link between (or within) containers, possibly across tabs.
    ///
    /// `dest_index` is clamped to the destination's length after removal.
    fn move_link(
        &mut self,
        link_id: &str,
        from_tab_id: &str,
        from_container_id: &str,
        to_tab_id: &str,
        to_container_id: &str,
        dest_index: usize,
    ) -> Result<(), LinkError> {
        let from_ti = self
            .document
            .tab_index(from_tab_id)
            .ok_or_else(|| LinkError::TabNotFound(from_tab_id.to_string()))?;
        let from_ci = self.document.tabs[from_ti]
            .container_index(from_container_id)
            .ok_or_else(|| LinkError::ContainerNotFound(from_container_id.to_string()))?;
        let li = self.document.tabs[from_ti].containers[from_ci]
            .link_index(link_id)
            .ok_or_else(|| LinkError::LinkNotFound(link_id.to_string()))?;
        let to_ti = self
            .document
            .tab_index(to_tab_id)
            .ok_or_else(|| LinkError::TabNotFound(to_tab_id.to_string()))?;
        let to_ci = self.document.tabs[to_ti]
            .container_index(to_container_id)
            .ok_or_else(|| LinkError::ContainerNotFound(to_container_id.to_string()))?;

        let link = self.document.tabs[from_ti].containers[from_ci].links.remove(li);
        let dest = &mut self.document.tabs[to_ti].containers[to_ci].links;
        let index = dest_index.min(dest.len());
        dest.insert(index, link);
        Ok(())
    }

    /// Adds a new container holding `links` to a tab. Ids that already exist
    /// in the document are replaced with fresh ones. Returns the container id,
    /// or `None` when there was nothing to import.
    fn import_links(&mut self, tab_id: &str, container_name: &str, links: Vec<Link>) -> Result<Option<String>, LinkError> {
        let name = Self::clean_name(container_name)?;
        self.find_tab(tab_id)?;
        if links.is_empty() {
            return Ok(None);
        }

        if let Some(i) = links.iter().position(|l| l.id.is_empty() || l.url.trim().is_empty()) {
            return Err(LinkError::Validation(format!("links[{}] needs a non-empty id and url", i)));
        }

        let mut taken: HashSet<String> =
            self.document.all_ids().into_iter().map(str::to_string).collect();
        let mut fresh = Vec::with_capacity(links.len());
        for mut link in links {
            if !taken.insert(link.id.clone()) {
                link.id = new_id(IdKind::Link);
                taken.insert(link.id.clone());
            }
            link.url = link.url.trim().to_string();
            if link.title.trim().is_empty() {
                link.title = link.url.clone();
            }
            fresh.push(link);
        }

        let id = new_id(IdKind::Container);
        if let Some(tab) = self.document.find_tab_mut(tab_id) {
            tab.containers.push(Container {
                id: id.clone(),
                name,
                links: fresh,
            });
        }
        Ok(Some(id))
    }

    /// Replaces the whole document. It must have at least one tab and pass
    /// structural validation.
    fn replace_document(&mut self, document: Document) -> Result<(), LinkError> {
        if document.tabs.is_empty() {
            return Err(LinkError::Validation("document must contain at least one tab".to_string()));
        }
        check_document(&document).map_err(|e| LinkError::Validation(e.to_string()))?;
        self.document = document;
        self.ensure_active_view();
        Ok(())
    }

    /// Unions `incoming` into the document. Returns whether anything was added.
    fn merge_document(&mut self, incoming: &Document) -> Result<bool, LinkError> {
        check_document(incoming).map_err(|e| LinkError::Validation(e.to_string()))?;
        let merged = merge(&self.document, incoming);
        let changed = merged != self.document;
        self.document = merged;
        Ok(changed)
    }

    /// Single entry point for UI commands.
    fn dispatch(&mut self, command: Command) -> Result<CommandOutcome, LinkError> {
        debug!("dispatch {:?}", command);
        let silent = command.ignores_missing_target();

        let result = match command {
            Command::AddTab { name } => self.add_tab(&name).map(|id| CommandOutcome::Created { id }),
            Command::DeleteTab { tab_id } => self.delete_tab(&tab_id).map(|_| CommandOutcome::Updated),
            Command::RenameTab { tab_id, name } => {
                self.rename_tab(&tab_id, &name).map(|_| CommandOutcome::Updated)
            }
            Command::SwitchTab { tab_id } => self.switch_tab(&tab_id).map(|_| CommandOutcome::Updated),
            Command::ShowTrash => {
                self.show_trash();
                Ok(CommandOutcome::Updated)
            }
            Command::AddContainer { tab_id, name } => self
                .add_container(&tab_id, &name)
                .map(|id| CommandOutcome::Created { id }),
            Command::RenameContainer { container_id, name } => self
                .rename_container(&container_id, &name)
                .map(|_| CommandOutcome::Updated),
            Command::DeleteContainer { container_id } => self
                .delete_container(&container_id)
                .map(|_| CommandOutcome::Updated),
            Command::MoveContainer {
                container_id,
                from_tab_id,
                to_tab_id,
                new_order,
            } => self
                .move_container(&container_id, &from_tab_id, &to_tab_id, &new_order)
                .map(|_| CommandOutcome::Updated),
            Command::TrashAllInContainer { container_id } => self
                .trash_all_in_container(&container_id)
                .map(|_| CommandOutcome::Updated),
            Command::AddLink {
                tab_id,
                container_id,
                url,
                title,
            } => self
                .add_link(&tab_id, &container_id, &url, &title)
                .map(|id| CommandOutcome::Created { id }),
            Command::DeleteLink { link_id } => self.delete_link(&link_id).map(|_| CommandOutcome::Updated),
            Command::MoveToTrash { link_id } => {
                self.move_to_trash(&link_id).map(|_| CommandOutcome::Updated)
            }
            Command::RestoreFromTrash { link_id } => self
                .restore_from_trash(&link_id)
                .map(|_| CommandOutcome::Updated),
            Command::PermanentDelete { link_id } => self
                .permanent_delete(&link_id)
                .map(|_| CommandOutcome::Updated),
            Command::EmptyTrash => {
                self.empty_trash();
                Ok(CommandOutcome::Updated)
            }
            Command::MoveLink {
                link_id,
                from_tab_id,
                from_container_id,
                to_tab_id,
                to_container_id,
                dest_index,
            } => self
                .move_link(
                    &link_id,
                    &from_tab_id,
                    &from_container_id,
                    &to_tab_id,
                    &to_container_id,
                    dest_index,
                )
                .map(|_| CommandOutcome::Updated),
            Command::ImportLinks {
                tab_id,
                container_name,
                links,
            } => self
                .import_links(&tab_id, &container_name, links)
                .map(|created| match created {
                    Some(id) => CommandOutcome::Created { id },
                    None => CommandOutcome::Unchanged,
                }),
            Command::ReplaceDocument { document } => {
                self.replace_document(document).map(|_| CommandOutcome::Updated)
            }
            Command::MergeDocument { document } => self.merge_document(&document).map(|changed| {
                if changed {
                    CommandOutcome::Updated
                } else {
                    CommandOutcome::Unchanged
                }
            }),
        };

        match result {
            Err(e) if silent && e.is_not_found() => {
                debug!("ignoring stale target: {}", e);
                Ok(CommandOutcome::Unchanged)
            }
            other => other,
        }
    }
}
