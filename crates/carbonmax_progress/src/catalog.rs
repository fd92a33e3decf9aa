//! Quest catalog: the read-only list of quests, loaded once at startup.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{ProgressError, Result};
use crate::types::Quest;

const BUILTIN_CATALOG: &str = include_str!("../data/quests.json");

#[derive(Debug, Clone)]
pub struct QuestCatalog {
    quests: Vec<Quest>,
    by_id: HashMap<String, usize>,
}

impl QuestCatalog {
    /// The catalog shipped with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Parse and validate a JSON array of quests.
    pub fn from_json(json: &str) -> Result<Self> {
        let quests: Vec<Quest> = serde_json::from_str(json)?;
        Self::new(quests)
    }

    pub fn new(quests: Vec<Quest>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(quests.len());
        for (index, quest) in quests.iter().enumerate() {
            validate(quest)?;
            if by_id.insert(quest.id.clone(), index).is_some() {
                return Err(ProgressError::DuplicateQuest(quest.id.clone()));
            }
        }
        debug!("Loaded quest catalog with {} quests", quests.len());
        Ok(Self { quests, by_id })
    }

    pub fn get(&self, id: &str) -> Option<&Quest> {
        self.by_id.get(id).map(|&index| &self.quests[index])
    }

    /// All quests in catalog order.
    pub fn quests(&self) -> &[Quest] {
        &self.quests
    }

    pub fn len(&self) -> usize {
        self.quests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }
}

fn validate(quest: &Quest) -> Result<()> {
    let invalid = |reason: &str| ProgressError::InvalidQuest {
        id: quest.id.clone(),
        reason: reason.to_string(),
    };
    if quest.id.trim().is_empty() {
        return Err(invalid("id must not be empty"));
    }
    if quest.base_points == 0 {
        return Err(invalid("base_points must be positive"));
    }
    if quest.bonus_condition.is_some() && quest.bonus_points.is_none() {
        return Err(invalid("bonus_condition given without bonus_points"));
    }
    Ok(())
}
