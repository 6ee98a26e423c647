use crate::protocol::{BrokerSpec, EtcdHeader, JournalSpec, ProcessId};
use crate::{AppError, AppResult};

/// Assignment is the ordered set of brokers responsible for a journal.
/// `primary` indexes `members`, with -1 denoting that no primary is
/// currently elected. An assignment with zero members means the cluster
/// could not place the journal on sufficient brokers.
#[derive(Clone, Debug, PartialEq)]
pub struct Assignment {
    pub members: Vec<ProcessId>,
    pub primary: i32,
}

impl Default for Assignment {
    fn default() -> Self {
        Assignment {
            members: Vec::new(),
            primary: -1,
        }
    }
}

impl Assignment {
    pub fn validate(&self) -> AppResult<()> {
        for member in &self.members {
            member.validate()?;
        }
        if self.primary < -1 || self.primary as i64 >= self.members.len() as i64 {
            return Err(AppError::InvalidValue(format!(
                "assignment primary {} is outside [-1, {})",
                self.primary,
                self.members.len()
            )));
        }
        Ok(())
    }

    pub fn is_member(&self, id: &ProcessId) -> bool {
        self.members.iter().any(|m| m == id)
    }
}

/// A single applied mutation of the key space.
#[derive(Clone, Debug)]
pub enum KeySpaceOp {
    PutBroker(BrokerSpec),
    DeleteBroker(ProcessId),
    PutJournal {
        spec: JournalSpec,
        assignment: Assignment,
    },
    DeleteJournal(String),
}

impl KeySpaceOp {
    pub fn validate(&self) -> AppResult<()> {
        match self {
            KeySpaceOp::PutBroker(spec) => spec.validate(),
            KeySpaceOp::DeleteBroker(id) => id.validate(),
            KeySpaceOp::PutJournal { spec, assignment } => {
                spec.validate()?;
                assignment.validate()
            }
            KeySpaceOp::DeleteJournal(name) => {
                if name.is_empty() {
                    Err(AppError::InvalidValue(
                        "journal name is empty".to_string(),
                    ))
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// One atomic batch of watcher-observed mutations, stamped with the
/// coordination-store response header at which they were read.
#[derive(Clone, Debug)]
pub struct KeySpaceUpdate {
    pub header: EtcdHeader,
    pub ops: Vec<KeySpaceOp>,
}

impl KeySpaceUpdate {
    pub fn new(header: EtcdHeader) -> Self {
        KeySpaceUpdate {
            header,
            ops: Vec::new(),
        }
    }

    pub fn put_broker(mut self, spec: BrokerSpec) -> Self {
        self.ops.push(KeySpaceOp::PutBroker(spec));
        self
    }

    pub fn delete_broker(mut self, id: ProcessId) -> Self {
        self.ops.push(KeySpaceOp::DeleteBroker(id));
        self
    }

    pub fn put_journal(mut self, spec: JournalSpec, assignment: Assignment) -> Self {
        self.ops.push(KeySpaceOp::PutJournal { spec, assignment });
        self
    }

    pub fn delete_journal(mut self, name: impl Into<String>) -> Self {
        self.ops.push(KeySpaceOp::DeleteJournal(name.into()));
        self
    }
}
