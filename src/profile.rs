//! User profiles and the presence roster.

use serde::{Deserialize, Serialize};

/// Another user of the backend, as shown in the contact list.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Profile {
    pub id: String,
    #[serde(rename = "displayName")]
    pub name: String,
    #[serde(rename = "avatarRef")]
    pub avatar: String,
    pub online: bool,
}

impl Profile {
    /// Merge a pushed record into this profile.
    ///
    /// Returns `true` if any fields were updated, `false` otherwise.
    pub fn merge_update(&mut self, update: &Profile) -> bool {
        let mut changed = false;

        if self.online != update.online {
            self.online = update.online;
            changed = true;
        }

        // Display metadata may change in the same record
        if self.name != update.name {
            self.name = update.name.clone();
            changed = true;
        }

        if self.avatar != update.avatar {
            self.avatar = update.avatar.clone();
            changed = true;
        }

        changed
    }
}

/// The roster of other users, mutated in place by presence events.
///
/// Membership is seeded once at startup and never grows from events; the
/// local user is filtered out at the seed and ignored in updates. Entries
/// live for the process lifetime.
#[derive(Clone, Debug)]
pub struct Roster {
    local_id: String,
    profiles: Vec<Profile>,
}

impl Roster {
    pub fn new(local_id: &str) -> Self {
        Self { local_id: local_id.to_string(), profiles: Vec::new() }
    }

    /// Seed the roster from a user listing, dropping the local user and
    /// any duplicate ids.
    pub fn seed(&mut self, profiles: Vec<Profile>) {
        self.profiles.clear();
        for profile in profiles {
            if profile.id == self.local_id {
                continue;
            }
            // Make sure we don't add the same profile twice
            if !self.profiles.iter().any(|p| p.id == profile.id) {
                self.profiles.push(profile);
            }
        }
    }

    /// Apply a pushed user record.
    ///
    /// Updates for the local user's own id are ignored, and unknown ids
    /// are a no-op rather than new entries. Returns `true` if an entry
    /// changed.
    pub fn apply_update(&mut self, update: Profile) -> bool {
        if update.id == self.local_id {
            return false;
        }

        match self.profiles.iter_mut().find(|p| p.id == update.id) {
            Some(existing) => existing.merge_update(&update),
            None => false,
        }
    }

    /// Read view: online users first, then offline, each group keeping
    /// its original relative order (a stable partition, not a re-sort).
    pub fn sorted_view(&self) -> Vec<Profile> {
        let mut view: Vec<Profile> =
            self.profiles.iter().filter(|p| p.online).cloned().collect();
        view.extend(self.profiles.iter().filter(|p| !p.online).cloned());
        view
    }

    pub fn get(&self, id: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    pub fn online_count(&self) -> usize {
        self.profiles.iter().filter(|p| p.online).count()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
