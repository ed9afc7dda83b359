//! Declarative navigation tree for the course book. This mirrors the
//! sidebar configuration of the published site: one intro entry plus five
//! collapsible chapter categories, each holding a single document.

/// Reference to one document of the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocRef {
    pub id: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone)]
pub enum SidebarItem {
    Doc(DocRef),
    Category {
        label: &'static str,
        collapsible: bool,
        collapsed: bool,
        items: Vec<DocRef>,
    },
}

/// One selectable line in the rendered sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidebarRow {
    Doc(DocRef),
    /// `index` points back into the sidebar item list so a toggle can find
    /// the category it belongs to.
    Category {
        index: usize,
        label: &'static str,
        collapsed: bool,
    },
    Child(DocRef),
}

fn chapter(label: &'static str, doc_id: &'static str, collapsed: bool) -> SidebarItem {
    SidebarItem::Category {
        label,
        collapsible: true,
        collapsed,
        items: vec![DocRef {
            id: doc_id,
            label: doc_id,
        }],
    }
}

/// The book's navigation tree. Chapter 1 starts expanded, the rest collapsed.
pub fn course_sidebar() -> Vec<SidebarItem> {
    vec![
        SidebarItem::Doc(DocRef {
            id: "intro",
            label: "Course Home",
        }),
        chapter("Chapter 1: Physical AI Foundations", "chapter-01", false),
        chapter("Chapter 2: ROS 2 & Robot Control", "chapter-02", true),
        chapter("Chapter 3: Simulation & Digital Twins", "chapter-03", true),
        chapter("Chapter 4: Isaac & Perception", "chapter-04", true),
        chapter("Chapter 5: VLA & Humanoid Capstone", "chapter-05", true),
    ]
}

/// Flatten the tree into the rows currently visible in the list, skipping
/// the children of collapsed categories.
pub fn visible_rows(items: &[SidebarItem]) -> Vec<SidebarRow> {
    let mut rows = Vec::new();
    for (index, item) in items.iter().enumerate() {
        match item {
            SidebarItem::Doc(doc) => rows.push(SidebarRow::Doc(*doc)),
            SidebarItem::Category {
                label,
                collapsed,
                items,
                ..
            } => {
                rows.push(SidebarRow::Category {
                    index,
                    label: *label,
                    collapsed: *collapsed,
                });
                if !*collapsed {
                    for doc in items {
                        rows.push(SidebarRow::Child(*doc));
                    }
                }
            }
        }
    }
    rows
}
