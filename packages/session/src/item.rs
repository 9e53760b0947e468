use serde::{Deserialize, Serialize};
use yishan_algo::MemoryState;

pub type ItemId = String;

/// Learnable unit supplied by the content store; the scheduler only reads `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub term: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub phonetic: Option<String>,
    #[serde(default)]
    pub example_sentence: Option<String>,
    #[serde(default)]
    pub example_translation: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Item {
    pub fn new(id: impl Into<ItemId>, term: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            term: term.into(),
            definition: String::new(),
            phonetic: None,
            example_sentence: None,
            example_translation: None,
            tags: Vec::new(),
        }
    }
}

/// An item together with its current memory state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCard {
    pub item: Item,
    pub state: MemoryState,
}

impl ReviewCard {
    pub fn new(item: Item, state: MemoryState) -> Self {
        Self { item, state }
    }

    pub fn id(&self) -> &str {
        &self.item.id
    }
}
