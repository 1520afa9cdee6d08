use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize, Serialize)]
pub enum TaskState {
    CheckPending,
    ExecPending,
    ExecSuccess,
    ExecReverted,
    WaitingForConfirmation,
    Blacklisted,
    Cancelled,
    NotFound,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastCheck {
    pub task_state: Option<TaskState>,
    /// Populated in case of simulation error or task cancellation
    pub message: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    pub status: Option<String>,
    pub transaction_hash: String,
    pub block_number: Option<u64>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    pub task_id: String,
    pub task_state: TaskState,
    pub chain_id: Option<u64>,
    pub created_at: Option<String>,
    /// Populated after the relay first simulates the task
    pub last_check: Option<LastCheck>,
    /// Populated once the transaction is mined
    pub execution: Option<Execution>,
}

impl TaskStatus {
    /// Hash of the executing transaction, if there is one
    pub fn transaction_hash(&self) -> Option<&str> {
        self.execution.as_ref().map(|e| e.transaction_hash.as_str())
    }

    /// Whether the last simulation reported an error
    pub fn last_check_mentions_error(&self) -> bool {
        self.last_check
            .as_ref()
            .and_then(|c| c.message.as_deref())
            .map(|m| m.to_lowercase().contains("error"))
            .unwrap_or(false)
    }
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusResult {
    /// Typically present when a task cannot be found (also gives 404 HTTP status)
    pub message: Option<String>,
    /// Present when a task is found
    pub task: Option<TaskStatus>,
}

impl TaskStatusResult {
    pub fn task_state(&self) -> TaskState {
        if let Some(task) = &self.task {
            return task.task_state;
        }
        TaskState::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn executed_task_reply_parses() {
        let reply = r#"{"task": {
            "taskId": "0x01",
            "taskState": "ExecSuccess",
            "chainId": 10,
            "lastCheck": {"taskState": "ExecPending", "message": "Submitted"},
            "execution": {"status": "success", "transactionHash": "0xabc", "blockNumber": 77}
        }}"#;
        let parsed: TaskStatusResult = serde_json::from_str(reply).unwrap();
        assert_eq!(parsed.task_state(), TaskState::ExecSuccess);
        let task = parsed.task.unwrap();
        assert_eq!(task.transaction_hash(), Some("0xabc"));
        assert!(!task.last_check_mentions_error());
    }

    #[test]
    fn unknown_states_and_missing_tasks() {
        let parsed: TaskStatusResult =
            serde_json::from_str(r#"{"message": "Task not found"}"#).unwrap();
        assert_eq!(parsed.task_state(), TaskState::NotFound);

        let parsed: TaskStatus = serde_json::from_str(
            r#"{"taskId": "1", "taskState": "SomethingNew", "lastCheck": {"message": "Execution Error: GAS_LIMIT"}}"#,
        )
        .unwrap();
        assert_eq!(parsed.task_state, TaskState::Unknown);
        assert!(parsed.last_check_mentions_error());
    }
}
