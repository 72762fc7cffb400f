use std::{
    convert::TryFrom,
    fmt, io,
    os::unix::process::ExitStatusExt,
    process::{Child, ExitStatus},
};

use nix::{sys::signal::Signal, unistd::Pid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(u32);

impl ProcessId {
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for ProcessId {
    fn from(value: u32) -> Self {
        ProcessId(value)
    }
}

impl From<&Child> for ProcessId {
    fn from(child: &Child) -> Self {
        ProcessId(child.id())
    }
}

impl From<Pid> for ProcessId {
    fn from(value: Pid) -> Self {
        ProcessId(value.as_raw() as u32)
    }
}

impl From<ProcessId> for Pid {
    fn from(value: ProcessId) -> Self {
        Pid::from_raw(value.0 as i32)
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A process running in the background that the shell is responsible for.
pub struct Job {
    id: ProcessId,
    /// The command as entered, used for messages.
    label: String,
    child: Child,
    /// Left-hand side of a background pipeline. It is reclaimed along with
    /// the job but never reported on its own.
    upstream: Option<Child>,
}

impl Job {
    pub fn new<S: Into<String>>(child: Child, label: S) -> Self {
        Self {
            id: ProcessId::from(&child),
            label: label.into(),
            child,
            upstream: None,
        }
    }

    pub fn with_upstream(self, upstream: Child) -> Self {
        Self {
            upstream: Some(upstream),
            ..self
        }
    }

    pub fn id(&self) -> ProcessId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Checks, without blocking, whether the job's process has terminated.
    pub(crate) fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        self.child.try_wait()
    }

    pub(crate) fn take_upstream(&mut self) -> Option<Child> {
        self.upstream.take()
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "id: {}\tlabel: {}", self.id, self.label)
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}] Running\t{}", self.id, self.label)
    }
}

/// A background job whose termination was observed by the job table.
#[derive(Clone, Debug, PartialEq)]
pub struct FinishedJob {
    pub id: ProcessId,
    pub label: String,
    pub status: ExitStatus,
}

impl fmt::Display for FinishedJob {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}]+ {}\t{}", self.id, describe_status(self.status), self.label)
    }
}

/// Describes how a process ended, e.g. `Done`, `Exit 2` or `SIGKILL`.
pub fn describe_status(status: ExitStatus) -> String {
    match (status.code(), status.signal()) {
        (Some(0), _) => "Done".to_string(),
        (Some(code), _) => format!("Exit {}", code),
        (None, Some(signal)) => signal_name(signal),
        (None, None) => "Unknown".to_string(),
    }
}

pub fn signal_name(signal: i32) -> String {
    Signal::try_from(signal)
        .map(|s| s.as_str().to_string())
        .unwrap_or_else(|_| format!("signal {}", signal))
}
