use super::IDispatchSlotRepo;
use chrono::NaiveDate;
use pill_reminder_domain::{SlotKey, SlotState};
use std::collections::HashMap;
use std::sync::Mutex;

/// Single process dedup table. The mutex makes `claim` atomic.
pub struct InMemoryDispatchSlotRepo {
    slots: Mutex<HashMap<SlotKey, SlotState>>,
}

impl InMemoryDispatchSlotRepo {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait::async_trait]
impl IDispatchSlotRepo for InMemoryDispatchSlotRepo {
    async fn claim(&self, key: &SlotKey) -> anyhow::Result<bool> {
        let mut slots = self.slots.lock().unwrap();
        let state = slots.entry(key.clone()).or_insert(SlotState::Pending);
        if state.is_claimable() {
            *state = SlotState::Claimed;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn transition(
        &self,
        key: &SlotKey,
        from: SlotState,
        to: SlotState,
    ) -> anyhow::Result<bool> {
        if !from.can_transition_to(to) {
            anyhow::bail!("Slot {} can not move from {} to {}", key, from.as_str(), to.as_str());
        }
        let mut slots = self.slots.lock().unwrap();
        match slots.get_mut(key) {
            Some(state) if *state == from => {
                *state = to;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find(&self, key: &SlotKey) -> anyhow::Result<Option<SlotState>> {
        let slots = self.slots.lock().unwrap();
        Ok(slots.get(key).copied())
    }

    async fn find_by_state(&self, state: SlotState) -> anyhow::Result<Vec<SlotKey>> {
        let slots = self.slots.lock().unwrap();
        Ok(slots
            .iter()
            .filter(|(_, s)| **s == state)
            .map(|(key, _)| key.clone())
            .collect())
    }

    async fn delete_before(&self, date: NaiveDate) -> anyhow::Result<u64> {
        let mut slots = self.slots.lock().unwrap();
        let before = slots.len();
        slots.retain(|key, _| key.date >= date);
        Ok((before - slots.len()) as u64)
    }
}
