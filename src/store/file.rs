use super::{
    CreateWorkflowRequest, StoreResponse, StoredWorkflow, UpdateWorkflowRequest, WorkflowStore,
};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A [`WorkflowStore`] keeping one JSON document per workflow in a
/// directory. Suitable for single-user setups and tooling; I/O failures
/// are reported as status-500 replies so callers handle them the same way
/// as any other collaborator failure.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Opens (and creates, if needed) the backing directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, io::Error> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    fn fresh_id(&self) -> String {
        let mut n = 1u64;
        loop {
            let id = format!("wf-{n}");
            if !self.path_for(&id).exists() {
                return id;
            }
            n += 1;
        }
    }

    fn read_record(&self, id: &str) -> StoreResponse<StoredWorkflow> {
        if !valid_id(id) {
            return StoreResponse::error(400, format!("invalid workflow id '{id}'"));
        }
        let path = self.path_for(id);
        if !path.exists() {
            return StoreResponse::error(404, format!("workflow '{id}' not found"));
        }
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => {
                return StoreResponse::error(500, format!("could not read '{}': {err}", path.display()));
            }
        };
        match serde_json::from_str(&text) {
            Ok(record) => StoreResponse::ok(record),
            Err(err) => {
                StoreResponse::error(500, format!("could not parse '{}': {err}", path.display()))
            }
        }
    }

    fn write_record(&self, record: &StoredWorkflow) -> Option<StoreResponse<StoredWorkflow>> {
        let path = self.path_for(&record.id);
        let text = match serde_json::to_string_pretty(record) {
            Ok(text) => text,
            Err(err) => return Some(StoreResponse::error(500, format!("could not encode: {err}"))),
        };
        if let Err(err) = fs::write(&path, text) {
            return Some(StoreResponse::error(
                500,
                format!("could not write '{}': {err}", path.display()),
            ));
        }
        None
    }
}

// Ids become file names; anything that could escape the directory is refused.
fn valid_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_')
}

impl WorkflowStore for JsonFileStore {
    fn create_workflow(&mut self, request: CreateWorkflowRequest) -> StoreResponse<StoredWorkflow> {
        let record = StoredWorkflow {
            id: self.fresh_id(),
            name: request.name,
            workflow: request.workflow_json,
            agent: None,
        };
        if let Some(failure) = self.write_record(&record) {
            return failure;
        }
        StoreResponse::ok(record)
    }

    fn update_workflow(&mut self, id: &str, request: UpdateWorkflowRequest) -> StoreResponse<()> {
        let mut record = match self.read_record(id) {
            StoreResponse {
                body: Some(record), ..
            } => record,
            failure => {
                return StoreResponse {
                    status: failure.status,
                    body: None,
                    message: failure.message,
                };
            }
        };
        if let Some(name) = request.name {
            record.name = name;
        }
        if let Some(document) = request.workflow_json {
            record.workflow = document;
        }
        if let Some(failure) = self.write_record(&record) {
            return StoreResponse {
                status: failure.status,
                body: None,
                message: failure.message,
            };
        }
        StoreResponse::ok(())
    }

    fn get_workflow(&mut self, id: &str) -> StoreResponse<StoredWorkflow> {
        self.read_record(id)
    }
}
