//! Everything one running client needs, built once at start-up.

use std::sync::Arc;

use famtasks_proto::presence::UserPresence;

use crate::clock::now_ms;
use crate::config::ClientConfig;
use crate::identity::{Identity, IdentityStore, NameError};
use crate::presence::{ActivityKind, HeartbeatGuard, PresenceModel};
use crate::storage::KeyValueStore;
use crate::sync::{LocalPresence, PresenceRoom, SyncBackend, SyncError, SyncStatus};
use crate::tasks::{TaskList, seed_tasks};
use crate::workspace::{self, Clipboard, Location, WorkspaceResolver};

/// A client session: identity, workspace, task list and presence.
///
/// Dropping the session leaves the presence room and stops the heartbeat.
pub struct Session {
    identity_store: IdentityStore,
    user_id: String,
    resolver: WorkspaceResolver,
    workspace_id: String,
    presence_room: String,
    tasks: TaskList,
    presence: Arc<PresenceModel>,
    _heartbeat: HeartbeatGuard,
    local_only: bool,
}

impl Session {
    /// Opens a session.
    ///
    /// Resolves the identity and the workspace, then binds the task list
    /// and the presence room on `backend`. When `backend` is `None` or
    /// refuses a binding, the failure is logged and that part runs
    /// local-only.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Codec`] if the initial task list cannot be
    /// encoded even for a local channel.
    pub fn open(
        config: &ClientConfig,
        backend: Option<&dyn SyncBackend>,
        persistent: Arc<dyn KeyValueStore>,
        session_store: Arc<dyn KeyValueStore>,
        location: Arc<dyn Location>,
    ) -> Result<Self, SyncError> {
        let identity_store = IdentityStore::new(persistent, session_store);
        let Identity { user_id, user_name } = identity_store.identity();

        let resolver = WorkspaceResolver::new(location, config.query_param.as_str());
        let workspace_id = resolver.get_or_create_workspace_id();
        let channel = workspace::task_channel(&config.task_channel_prefix, &workspace_id);
        let presence_room = workspace::presence_room(&config.presence_room_prefix, &workspace_id);

        let now = now_ms();
        let initial_tasks = if config.seed_demo_tasks {
            seed_tasks(now)
        } else {
            Vec::new()
        };
        let initial_presence = UserPresence::active(user_name.as_str(), now);

        let mut local_only = backend.is_none();
        let tasks = match backend.map(|b| TaskList::bind(b, &channel, initial_tasks.clone())) {
            Some(Ok(tasks)) => tasks,
            Some(Err(e)) => {
                tracing::error!(channel = %channel, error = %e, "task sync unavailable, running local-only");
                local_only = true;
                TaskList::local(&channel, initial_tasks)?
            }
            None => TaskList::local(&channel, initial_tasks)?,
        };

        let joined = backend.map(|b| b.join_room(&presence_room, &user_id, initial_presence.clone()));
        let room: Arc<dyn PresenceRoom> = match joined {
            Some(Ok(room)) => room,
            Some(Err(e)) => {
                tracing::error!(room = %presence_room, error = %e, "presence unavailable, running local-only");
                local_only = true;
                Arc::new(LocalPresence::new(user_id.as_str(), initial_presence.clone()))
            }
            None => Arc::new(LocalPresence::new(user_id.as_str(), initial_presence.clone())),
        };

        let presence = Arc::new(PresenceModel::new(room, initial_presence, config.presence));
        let heartbeat = presence.spawn_heartbeat();

        tracing::info!(
            user_id = %user_id,
            workspace_id = %workspace_id,
            local_only,
            "session opened"
        );

        Ok(Self {
            identity_store,
            user_id,
            resolver,
            workspace_id,
            presence_room,
            tasks,
            presence,
            _heartbeat: heartbeat,
            local_only,
        })
    }

    /// Who the local participant is right now.
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.user_id.clone(),
            user_name: self.presence.current_user().name,
        }
    }

    /// The workspace id.
    #[must_use]
    pub fn workspace_id(&self) -> &str {
        &self.workspace_id
    }

    /// Name of the presence room.
    #[must_use]
    pub fn presence_room(&self) -> &str {
        &self.presence_room
    }

    /// The shareable invite link.
    #[must_use]
    pub fn invite_link(&self) -> String {
        self.resolver.get_invite_link()
    }

    /// Copies the invite link; returns whether it worked.
    pub fn copy_invite_link(&self, clipboard: &dyn Clipboard) -> bool {
        self.resolver.copy_invite_link(clipboard)
    }

    /// The shared task list.
    #[must_use]
    pub const fn tasks(&self) -> &TaskList {
        &self.tasks
    }

    /// The presence view-model.
    #[must_use]
    pub const fn presence(&self) -> &Arc<PresenceModel> {
        &self.presence
    }

    /// Records a user interaction.
    pub fn record_activity(&self, kind: ActivityKind) -> bool {
        self.presence.record_activity(kind)
    }

    /// Changes the display name and publishes it.
    ///
    /// # Errors
    ///
    /// Returns [`NameError`] if the name is invalid or cannot be saved.
    pub fn rename(&self, candidate: &str) -> Result<String, NameError> {
        self.presence.rename(&self.identity_store, candidate)
    }

    /// Whether any binding fell back to local-only mode.
    #[must_use]
    pub const fn is_local_only(&self) -> bool {
        self.local_only
    }

    /// Readiness of task sync; always offline in local-only mode.
    #[must_use]
    pub fn status(&self) -> SyncStatus {
        if self.local_only {
            SyncStatus::OFFLINE
        } else {
            self.tasks.status()
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.presence.leave();
        tracing::debug!(workspace_id = %self.workspace_id, "session closed");
    }
}
