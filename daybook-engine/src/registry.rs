use crate::model::{Task, TaskId, TaskPatch, UserId};

/// In-memory set of tasks for the active session. This is the merge point
/// for local edits and server-confirmed state; everything here is
/// synchronous and network traffic happens elsewhere.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: Vec<Task>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the full set, used when restoring a snapshot.
    pub fn load(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
    }

    /// Replaces one owner's tasks, leaving other owners untouched.
    pub fn replace_owner(&mut self, owner: UserId, tasks: Vec<Task>) {
        self.tasks.retain(|t| t.owner != owner);
        self.tasks.extend(tasks);
    }

    pub fn insert(&mut self, task: Task) {
        self.tasks.push(task);
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    pub fn get_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| &t.id == id)
    }

    /// Merges a pending patch into one task. Returns false when the task
    /// is no longer present, e.g. deleted while the edit was staged.
    pub fn apply_patch(&mut self, id: &TaskId, patch: &TaskPatch) -> bool {
        match self.get_mut(id) {
            Some(task) => {
                patch.apply_to(task);
                true
            }
            None => false,
        }
    }

    /// Adopts the server-confirmed copy of a task. `prior_id` keys the
    /// swap so a local-id task can come back carrying its assigned remote
    /// id.
    pub fn adopt(&mut self, prior_id: &TaskId, confirmed: Task) {
        match self.get_mut(prior_id) {
            Some(task) => *task = confirmed,
            None => self.tasks.push(confirmed),
        }
    }

    pub fn remove(&mut self, id: &TaskId) -> Option<Task> {
        let index = self.tasks.iter().position(|t| &t.id == id)?;
        Some(self.tasks.remove(index))
    }

    /// Today's working view: the owner's tasks that are not completed.
    pub fn list(&self, owner: UserId) -> Vec<Task> {
        self.tasks
            .iter()
            .filter(|t| t.owner == owner && !t.is_completed())
            .cloned()
            .collect()
    }

    /// The owner's completed tasks.
    pub fn completed(&self, owner: UserId) -> Vec<Task> {
        self.tasks
            .iter()
            .filter(|t| t.owner == owner && t.is_completed())
            .cloned()
            .collect()
    }

    /// Everything the owner has, completed or not, for sync payloads and
    /// snapshots.
    pub fn all(&self, owner: UserId) -> Vec<Task> {
        self.tasks
            .iter()
            .filter(|t| t.owner == owner)
            .cloned()
            .collect()
    }

    pub fn clear_owner(&mut self, owner: UserId) {
        self.tasks.retain(|t| t.owner != owner);
    }

    /// Drops the owner's tasks whose trimmed title is empty. Runs before
    /// any flush; a blank row must never be persisted.
    pub fn compact(&mut self, owner: UserId) -> usize {
        let before = self.tasks.len();
        self.tasks
            .retain(|t| t.owner != owner || !t.has_blank_title());
        let dropped = before - self.tasks.len();
        if dropped > 0 {
            tracing::debug!("compacted {} blank task(s)", dropped);
        }
        dropped
    }

    /// One scheduler tick: every running task of the owner accrues one
    /// second. Stopped tasks and other owners are untouched.
    pub fn tick(&mut self, owner: UserId) {
        for task in &mut self.tasks {
            if task.owner == owner && task.timer_running {
                task.elapsed_seconds += 1;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TaskEdit, TaskStatus};

    fn make_task(id: TaskId, title: &str, owner: i32) -> Task {
        Task::new(id, title, UserId::new(owner))
    }

    fn running(mut task: Task) -> Task {
        task.timer_running = true;
        task
    }

    #[test]
    fn tick_increments_only_running_tasks_of_owner() {
        let mut registry = TaskRegistry::new();
        registry.insert(running(make_task(TaskId::Local(1), "a", 7)));
        registry.insert(make_task(TaskId::Local(2), "b", 7));
        registry.insert(running(make_task(TaskId::Local(3), "c", 8)));

        for _ in 0..5 {
            registry.tick(UserId::new(7));
        }

        assert_eq!(registry.get(&TaskId::Local(1)).unwrap().elapsed_seconds, 5);
        assert_eq!(registry.get(&TaskId::Local(2)).unwrap().elapsed_seconds, 0);
        assert_eq!(registry.get(&TaskId::Local(3)).unwrap().elapsed_seconds, 0);
    }

    #[test]
    fn tick_accrues_concurrent_timers_independently() {
        let mut registry = TaskRegistry::new();
        registry.insert(running(make_task(TaskId::Local(1), "a", 7)));
        registry.insert(running(make_task(TaskId::Local(2), "b", 7)));

        for _ in 0..3 {
            registry.tick(UserId::new(7));
        }

        assert_eq!(registry.get(&TaskId::Local(1)).unwrap().elapsed_seconds, 3);
        assert_eq!(registry.get(&TaskId::Local(2)).unwrap().elapsed_seconds, 3);
    }

    #[test]
    fn list_excludes_completed() {
        let mut registry = TaskRegistry::new();
        registry.insert(make_task(TaskId::Local(1), "open", 7));
        registry.insert(make_task(TaskId::Local(2), "done", 7).with_status(TaskStatus::Completed));

        let listed = registry.list(UserId::new(7));
        let completed = registry.completed(UserId::new(7));

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "open");
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].title, "done");
    }

    #[test]
    fn compact_drops_blank_titles() {
        let mut registry = TaskRegistry::new();
        registry.insert(make_task(TaskId::Local(1), "keep", 7));
        registry.insert(make_task(TaskId::Local(2), "   ", 7));
        registry.insert(make_task(TaskId::Local(3), "", 7));

        let dropped = registry.compact(UserId::new(7));

        assert_eq!(dropped, 2);
        assert_eq!(registry.len(), 1);
        assert!(registry.get(&TaskId::Local(1)).is_some());
    }

    #[test]
    fn adopt_swaps_local_id_for_remote() {
        let mut registry = TaskRegistry::new();
        registry.insert(make_task(TaskId::Local(1), "draft", 7));

        let confirmed = make_task(TaskId::remote("t-1"), "draft", 7);
        registry.adopt(&TaskId::Local(1), confirmed);

        assert!(registry.get(&TaskId::Local(1)).is_none());
        assert!(registry.get(&TaskId::remote("t-1")).is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn apply_patch_reports_missing_task() {
        let mut registry = TaskRegistry::new();
        registry.insert(make_task(TaskId::Local(1), "draft", 7));

        let patch = TaskPatch::from_edit(TaskEdit::Title("renamed".to_string()));

        assert!(registry.apply_patch(&TaskId::Local(1), &patch));
        assert!(!registry.apply_patch(&TaskId::Local(9), &patch));
        assert_eq!(registry.get(&TaskId::Local(1)).unwrap().title, "renamed");
    }

    #[test]
    fn replace_owner_keeps_other_owners() {
        let mut registry = TaskRegistry::new();
        registry.insert(make_task(TaskId::Local(1), "mine", 7));
        registry.insert(make_task(TaskId::Local(2), "theirs", 8));

        registry.replace_owner(UserId::new(7), vec![make_task(TaskId::remote("t-5"), "pulled", 7)]);

        assert_eq!(registry.len(), 2);
        assert!(registry.get(&TaskId::remote("t-5")).is_some());
        assert!(registry.get(&TaskId::Local(2)).is_some());
        assert!(registry.get(&TaskId::Local(1)).is_none());
    }
}
