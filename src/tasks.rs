use tokio::sync::mpsc::UnboundedSender;

use crate::models::Task;
use crate::sync::{SyncCommand, SyncFailure};

/// Owns the in-memory task sequence for the session. Every mutation is
/// applied locally first, then enqueued for the sync worker; callers never
/// wait on the network.
pub struct TaskCollection {
    tasks: Vec<Task>,
    next_id: u64,
    outbound: UnboundedSender<SyncCommand>,
}

impl TaskCollection {
    pub fn new(outbound: UnboundedSender<SyncCommand>) -> Self {
        TaskCollection {
            tasks: Vec::new(),
            next_id: 1,
            outbound,
        }
    }

    /// Applies the startup listing. Runs once per session; a failed fetch is
    /// logged and the session continues against an empty collection.
    pub fn apply_listing(&mut self, listing: anyhow::Result<Vec<Task>>) {
        match listing {
            Ok(tasks) => {
                // Ids are minted from a counter that never runs backwards, so
                // a deleted id is never reissued to a later task.
                self.next_id = tasks.iter().map(|t| t.id).max().map_or(1, |max| max + 1);
                self.tasks = tasks;
            }
            Err(error) => {
                log::error!("loading tasks from the server failed: {:#}", error);
            }
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Appends a new pending task and queues the remote create. Whitespace-only
    /// input never becomes a task.
    pub fn add(&mut self, description: &str) -> Option<u64> {
        let description = description.trim();
        if description.is_empty() {
            return None;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.tasks.push(Task::new(id, description));
        self.send(SyncCommand::Create {
            id,
            description: description.to_string(),
        });
        Some(id)
    }

    /// Flips the completion flag of the matching task and queues the remote
    /// update with the task's new value.
    pub fn toggle(&mut self, id: u64) -> Option<bool> {
        let task = self.tasks.iter_mut().find(|t| t.id == id)?;
        task.completed = !task.completed;
        let completed = task.completed;
        self.send(SyncCommand::SetCompleted { id, completed });
        Some(completed)
    }

    /// Removes the matching task and queues the remote delete. The removed
    /// entity travels with the command so a failed delete can be restored.
    pub fn remove(&mut self, id: u64) -> Option<Task> {
        let position = self.tasks.iter().position(|t| t.id == id)?;
        let task = self.tasks.remove(position);
        self.send(SyncCommand::Delete { task: task.clone() });
        Some(task)
    }

    /// Undoes the optimistic write behind a mutation the worker gave up on.
    /// Returns the notice shown to the user.
    pub fn revert(&mut self, failure: &SyncFailure) -> String {
        match &failure.command {
            SyncCommand::Create { id, description } => {
                self.tasks.retain(|t| t.id != *id);
                format!("could not save \"{}\", removed it again", description)
            }
            SyncCommand::SetCompleted { id, completed } => {
                if let Some(task) = self.tasks.iter_mut().find(|t| t.id == *id) {
                    task.completed = !completed;
                }
                format!("could not update task {}", id)
            }
            SyncCommand::Delete { task } => {
                self.tasks.push(task.clone());
                format!("could not delete \"{}\", restored it", task.description)
            }
        }
    }

    fn send(&self, command: SyncCommand) {
        if self.outbound.send(command).is_err() {
            log::warn!("sync worker is gone, local changes will not be persisted");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn setup() -> (TaskCollection, UnboundedReceiver<SyncCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (TaskCollection::new(tx), rx)
    }

    fn drain(rx: &mut UnboundedReceiver<SyncCommand>) -> Vec<SyncCommand> {
        let mut commands = Vec::new();
        while let Ok(command) = rx.try_recv() {
            commands.push(command);
        }
        commands
    }

    #[test]
    fn initial_listing_replaces_state() {
        let (mut collection, _rx) = setup();
        collection.apply_listing(Ok(vec![Task::new(1, "a")]));
        assert_eq!(collection.tasks(), &[Task::new(1, "a")]);
    }

    #[test]
    fn failed_listing_leaves_collection_empty_and_usable() {
        let (mut collection, mut rx) = setup();
        collection.apply_listing(Err(anyhow!("connection refused")));
        assert!(collection.is_empty());

        // the session keeps working against the empty collection
        let id = collection.add("buy milk").unwrap();
        assert_eq!(id, 1);
        assert_eq!(drain(&mut rx).len(), 1);
    }

    #[test]
    fn add_appends_pending_task_and_issues_create() {
        let (mut collection, mut rx) = setup();
        let id = collection.add("buy milk").unwrap();

        assert_eq!(collection.len(), 1);
        let task = &collection.tasks()[0];
        assert_eq!(task.description, "buy milk");
        assert!(!task.completed);

        assert_eq!(
            drain(&mut rx),
            vec![SyncCommand::Create {
                id,
                description: "buy milk".to_string(),
            }]
        );
    }

    #[test]
    fn whitespace_only_add_is_a_noop() {
        let (mut collection, mut rx) = setup();
        assert_eq!(collection.add("   "), None);
        assert!(collection.is_empty());
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn toggle_sends_new_per_task_value() {
        let (mut collection, mut rx) = setup();
        collection.apply_listing(Ok(vec![Task::new(1, "a")]));

        let completed = collection.toggle(1).unwrap();
        assert!(completed);
        assert!(collection.tasks()[0].completed);
        assert_eq!(
            drain(&mut rx),
            vec![SyncCommand::SetCompleted {
                id: 1,
                completed: true,
            }]
        );
    }

    #[test]
    fn toggle_unknown_id_is_a_noop() {
        let (mut collection, mut rx) = setup();
        collection.apply_listing(Ok(vec![Task::new(1, "a")]));
        assert_eq!(collection.toggle(99), None);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn remove_drops_exactly_one_and_issues_one_delete() {
        let (mut collection, mut rx) = setup();
        collection.apply_listing(Ok(vec![
            Task::new(1, "a"),
            Task::new(2, "b"),
            Task::new(3, "c"),
        ]));

        let removed = collection.remove(2).unwrap();
        assert_eq!(removed.id, 2);
        let remaining: Vec<u64> = collection.tasks().iter().map(|t| t.id).collect();
        assert_eq!(remaining, vec![1, 3]);

        let commands = drain(&mut rx);
        assert_eq!(commands.len(), 1);
        assert!(matches!(&commands[0], SyncCommand::Delete { task } if task.id == 2));
    }

    #[test]
    fn ids_never_collide_after_delete_then_add() {
        let (mut collection, _rx) = setup();
        collection.apply_listing(Ok(vec![
            Task::new(1, "a"),
            Task::new(2, "b"),
            Task::new(3, "c"),
        ]));

        collection.remove(3);
        let id = collection.add("new task").unwrap();

        assert_eq!(id, 4);
        let mut ids: Vec<u64> = collection.tasks().iter().map(|t| t.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), collection.len());
    }

    #[test]
    fn counter_reseeds_from_non_contiguous_listing() {
        let (mut collection, _rx) = setup();
        collection.apply_listing(Ok(vec![Task::new(2, "a"), Task::new(7, "b")]));
        assert_eq!(collection.add("c"), Some(8));
    }

    #[test]
    fn revert_removes_unsaved_task() {
        let (mut collection, mut rx) = setup();
        let id = collection.add("buy milk").unwrap();
        let command = drain(&mut rx).remove(0);

        collection.revert(&SyncFailure {
            command,
            error: anyhow!("server down"),
        });
        assert!(collection.is_empty());
        assert_eq!(collection.add("again"), Some(id + 1));
    }

    #[test]
    fn revert_flips_completion_back() {
        let (mut collection, mut rx) = setup();
        collection.apply_listing(Ok(vec![Task::new(1, "a")]));
        collection.toggle(1);
        let command = drain(&mut rx).remove(0);

        collection.revert(&SyncFailure {
            command,
            error: anyhow!("server down"),
        });
        assert!(!collection.tasks()[0].completed);
    }

    #[test]
    fn revert_restores_deleted_task() {
        let (mut collection, mut rx) = setup();
        collection.apply_listing(Ok(vec![Task::new(1, "a"), Task::new(2, "b")]));
        collection.remove(1);
        let command = drain(&mut rx).remove(0);

        collection.revert(&SyncFailure {
            command,
            error: anyhow!("server down"),
        });
        assert_eq!(collection.len(), 2);
        assert!(collection.tasks().iter().any(|t| t.id == 1));
    }
}
