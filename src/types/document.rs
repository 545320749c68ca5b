use serde::{Deserialize, Serialize};

/// A saved URL with a display title.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub id: String,
    pub title: String,
    pub url: String,
    /// Milliseconds since the UNIX epoch, set by import adapters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imported_at: Option<i64>,
}

impl Link {
    /// Builds a link, falling back to the url when `title` is blank.
    pub fn new(id: String, title: &str, url: &str) -> Self {
        let title = title.trim();
        Self {
            id,
            title: if title.is_empty() { url.to_string() } else { title.to_string() },
            url: url.to_string(),
            imported_at: None,
        }
    }
}

/// Named, ordered group of links within a tab.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Container {
    pub id: String,
    pub name: String,
    pub links: Vec<Link>,
}

impl Container {
    pub fn find_link(&self, link_id: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.id == link_id)
    }

    pub fn link_index(&self, link_id: &str) -> Option<usize> {
        self.links.iter().position(|l| l.id == link_id)
    }
}

/// Top-level workspace holding containers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tab {
    pub id: String,
    pub name: String,
    pub containers: Vec<Container>,
}

impl Tab {
    pub fn find_container(&self, container_id: &str) -> Option<&Container> {
        self.containers.iter().find(|c| c.id == container_id)
    }

    pub fn find_container_mut(&mut self, container_id: &str) -> Option<&mut Container> {
        self.containers.iter_mut().find(|c| c.id == container_id)
    }

    pub fn container_index(&self, container_id: &str) -> Option<usize> {
        self.containers.iter().position(|c| c.id == container_id)
    }

    /// Locates a link anywhere in this tab, returning `(container index, link index)`.
    pub fn locate_link(&self, link_id: &str) -> Option<(usize, usize)> {
        self.containers
            .iter()
            .enumerate()
            .find_map(|(ci, c)| c.link_index(link_id).map(|li| (ci, li)))
    }

    pub fn total_links(&self) -> usize {
        self.containers.iter().map(|c| c.links.len()).sum()
    }
}

/// The whole persisted collection: tabs plus a document-wide trash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub tabs: Vec<Tab>,
    #[serde(default)]
    pub trash: Vec<Link>,
}

impl Document {
    /// The built-in collection used the first time storage has nothing saved.
    pub fn seed() -> Self {
        fn link(id: &str, title: &str, url: &str) -> Link {
            Link {
                id: id.to_string(),
                title: title.to_string(),
                url: url.to_string(),
                imported_at: None,
            }
        }

        Self {
            tabs: vec![
                Tab {
                    id: "tab-1".to_string(),
                    name: "Programming".to_string(),
                    containers: vec![
                        Container {
                            id: "container-1".to_string(),
                            name: "JavaScript".to_string(),
                            links: vec![
                                link("link-1", "MDN Web Docs", "https://developer.mozilla.org"),
                                link("link-2", "JavaScript.info", "https://javascript.info"),
                            ],
                        },
                        Container {
                            id: "container-2".to_string(),
                            name: "Python".to_string(),
                            links: vec![link(
                                "link-3",
                                "Python Documentation",
                                "https://docs.python.org",
                            )],
                        },
                    ],
                },
                Tab {
                    id: "tab-2".to_string(),
                    name: "Reading List".to_string(),
                    containers: vec![Container {
                        id: "container-3".to_string(),
                        name: "Articles".to_string(),
                        links: vec![link("link-4", "Medium", "https://medium.com")],
                    }],
                },
            ],
            trash: Vec::new(),
        }
    }

    pub fn find_tab(&self, tab_id: &str) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == tab_id)
    }

    pub fn find_tab_mut(&mut self, tab_id: &str) -> Option<&mut Tab> {
        self.tabs.iter_mut().find(|t| t.id == tab_id)
    }

    pub fn tab_index(&self, tab_id: &str) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == tab_id)
    }

    pub fn find_container(&self, tab_id: &str, container_id: &str) -> Option<&Container> {
        self.find_tab(tab_id)?.find_container(container_id)
    }

    pub fn find_link(&self, tab_id: &str, container_id: &str, link_id: &str) -> Option<&Link> {
        self.find_container(tab_id, container_id)?.find_link(link_id)
    }

    /// Finds which tab owns a container, by container id alone.
    pub fn locate_container(&self, container_id: &str) -> Option<(usize, usize)> {
        self.tabs
            .iter()
            .enumerate()
            .find_map(|(ti, t)| t.container_index(container_id).map(|ci| (ti, ci)))
    }

    pub fn trash_index(&self, link_id: &str) -> Option<usize> {
        self.trash.iter().position(|l| l.id == link_id)
    }

    /// Links across every tab plus the trash.
    pub fn total_links(&self) -> usize {
        self.tabs.iter().map(Tab::total_links).sum::<usize>() + self.trash.len()
    }

    pub fn total_links_in_tab(&self, tab_id: &str) -> Option<usize> {
        self.find_tab(tab_id).map(Tab::total_links)
    }

    /// Every id in the document: tabs, containers, links and trash.
    pub fn all_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        for tab in &self.tabs {
            ids.push(tab.id.as_str());
            for container in &tab.containers {
                ids.push(container.id.as_str());
                ids.extend(container.links.iter().map(|l| l.id.as_str()));
            }
        }
        ids.extend(self.trash.iter().map(|l| l.id.as_str()));
        ids
    }
}

/// Which view the session currently shows. Not part of the document's structure.
///
/// Serialized as the stored string: a tab id, or the trash sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActiveView {
    Tab(String),
    Trash,
}

impl ActiveView {
    /// Stored in place of a tab id while the trash view is showing.
    pub const TRASH_SENTINEL: &'static str = "__trash__";

    pub fn tab_id(&self) -> Option<&str> {
        match self {
            ActiveView::Tab(id) => Some(id),
            ActiveView::Trash => None,
        }
    }

    pub fn as_stored(&self) -> &str {
        match self {
            ActiveView::Tab(id) => id,
            ActiveView::Trash => Self::TRASH_SENTINEL,
        }
    }

    pub fn from_stored(value: &str) -> Self {
        if value == Self::TRASH_SENTINEL {
            ActiveView::Trash
        } else {
            ActiveView::Tab(value.to_string())
        }
    }
}

impl From<String> for ActiveView {
    fn from(value: String) -> Self {
        ActiveView::from_stored(&value)
    }
}

impl From<ActiveView> for String {
    fn from(view: ActiveView) -> Self {
        view.as_stored().to_string()
    }
}

/// Link counts shown by the UI header.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentStats {
    pub tabs: usize,
    pub containers: usize,
    pub links: usize,
    pub trashed: usize,
}

impl From<&Document> for DocumentStats {
    fn from(doc: &Document) -> Self {
        Self {
            tabs: doc.tabs.len(),
            containers: doc.tabs.iter().map(|t| t.containers.len()).sum(),
            links: doc.total_links(),
            trashed: doc.trash.len(),
        }
    }
}
