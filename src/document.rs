use serde::{Deserialize, Serialize};

/// A parsed book: chapters in insertion order, each holding its items in
/// source order. Duplicate chapter titles merge into one chapter.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub chapters: Vec<Chapter>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chapter {
    pub title: String,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Item {
    Text { content: String },
    Image { url: String },
}

impl Document {
    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    pub fn text_item_count(&self) -> usize {
        self.chapters
            .iter()
            .flat_map(|chapter| chapter.items.iter())
            .filter(|item| matches!(item, Item::Text { .. }))
            .count()
    }

    /// Returns the chapter with the given title, creating it at the end if it
    /// does not exist yet. A title seen before re-activates the existing
    /// chapter, so items keep appending to its original sequence.
    pub fn chapter_mut(&mut self, title: &str) -> &mut Chapter {
        let position = self
            .chapters
            .iter()
            .position(|chapter| chapter.title == title);
        let index = match position {
            Some(index) => index,
            None => {
                self.chapters.push(Chapter {
                    title: title.to_owned(),
                    items: Vec::new(),
                });
                self.chapters.len() - 1
            }
        };
        &mut self.chapters[index]
    }
}

/// The enriched counterpart of [`Document`]: same chapters, same item order,
/// with every text item carrying its explanation. Images pass through
/// unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnnotatedDocument {
    pub chapters: Vec<AnnotatedChapter>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnnotatedChapter {
    pub title: String,
    pub items: Vec<AnnotatedItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnnotatedItem {
    Text { original: String, explanation: String },
    Image { url: String },
}

impl AnnotatedDocument {
    /// Converts a document that needs no enrichment (no text items, or callers
    /// that want the raw text carried over with empty explanations).
    pub fn passthrough(document: Document) -> Self {
        let chapters = document
            .chapters
            .into_iter()
            .map(|chapter| AnnotatedChapter {
                title: chapter.title,
                items: chapter
                    .items
                    .into_iter()
                    .map(|item| match item {
                        Item::Text { content } => AnnotatedItem::Text {
                            original: content,
                            explanation: String::new(),
                        },
                        Item::Image { url } => AnnotatedItem::Image { url },
                    })
                    .collect(),
            })
            .collect();
        Self { chapters }
    }

    pub fn text_item_count(&self) -> usize {
        self.chapters
            .iter()
            .flat_map(|chapter| chapter.items.iter())
            .filter(|item| matches!(item, AnnotatedItem::Text { .. }))
            .count()
    }
}
