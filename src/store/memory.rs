use super::{
    CreateWorkflowRequest, StoreResponse, StoredWorkflow, UpdateWorkflowRequest, WorkflowStore,
};
use ahash::AHashMap;

/// An in-memory [`WorkflowStore`], used by tests and demos. Supports
/// injecting a single failure to exercise error paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    workflows: AHashMap<String, StoredWorkflow>,
    next_id: u64,
    fail_next: Option<(u16, String)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next store call answer with the given status and message
    /// instead of performing its operation.
    pub fn fail_next(&mut self, status: u16, message: impl Into<String>) {
        self.fail_next = Some((status, message.into()));
    }

    pub fn len(&self) -> usize {
        self.workflows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workflows.is_empty()
    }

    /// Direct record access, bypassing the collaborator contract.
    pub fn record(&self, id: &str) -> Option<&StoredWorkflow> {
        self.workflows.get(id)
    }

    /// Seeds a record, bypassing the collaborator contract.
    pub fn insert(&mut self, record: StoredWorkflow) {
        self.workflows.insert(record.id.clone(), record);
    }

    fn injected<T>(&mut self) -> Option<StoreResponse<T>> {
        self.fail_next
            .take()
            .map(|(status, message)| StoreResponse::error(status, message))
    }
}

impl WorkflowStore for MemoryStore {
    fn create_workflow(&mut self, request: CreateWorkflowRequest) -> StoreResponse<StoredWorkflow> {
        if let Some(response) = self.injected() {
            return response;
        }
        self.next_id += 1;
        let id = format!("wf-{}", self.next_id);
        let record = StoredWorkflow {
            id: id.clone(),
            name: request.name,
            workflow: request.workflow_json,
            agent: None,
        };
        self.workflows.insert(id, record.clone());
        StoreResponse::ok(record)
    }

    fn update_workflow(&mut self, id: &str, request: UpdateWorkflowRequest) -> StoreResponse<()> {
        if let Some(response) = self.injected() {
            return response;
        }
        match self.workflows.get_mut(id) {
            Some(record) => {
                if let Some(name) = request.name {
                    record.name = name;
                }
                if let Some(document) = request.workflow_json {
                    record.workflow = document;
                }
                StoreResponse::ok(())
            }
            None => StoreResponse::error(404, format!("workflow '{id}' not found")),
        }
    }

    fn get_workflow(&mut self, id: &str) -> StoreResponse<StoredWorkflow> {
        if let Some(response) = self.injected() {
            return response;
        }
        match self.workflows.get(id) {
            Some(record) => StoreResponse::ok(record.clone()),
            None => StoreResponse::error(404, format!("workflow '{id}' not found")),
        }
    }
}
