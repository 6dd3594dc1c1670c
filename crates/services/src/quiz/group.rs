use std::sync::Mutex;

use quiz_core::model::GroupId;

/// Tells the engine which card group the user currently has open.
pub trait GroupResolver: Send + Sync {
    fn current_group_id(&self) -> Option<GroupId>;
}

/// A resolver backed by an in-memory selection the host updates.
#[derive(Debug, Default)]
pub struct SelectedGroup {
    current: Mutex<Option<GroupId>>,
}

impl SelectedGroup {
    #[must_use]
    pub fn new(current: Option<GroupId>) -> Self {
        Self {
            current: Mutex::new(current),
        }
    }

    pub fn select(&self, group: Option<GroupId>) {
        if let Ok(mut guard) = self.current.lock() {
            *guard = group;
        }
    }
}

impl GroupResolver for SelectedGroup {
    fn current_group_id(&self) -> Option<GroupId> {
        self.current.lock().ok().and_then(|guard| *guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_can_change() {
        let groups = SelectedGroup::new(None);
        assert_eq!(groups.current_group_id(), None);
        groups.select(Some(GroupId::new(4)));
        assert_eq!(groups.current_group_id(), Some(GroupId::new(4)));
    }
}
