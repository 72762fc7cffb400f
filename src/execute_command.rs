//! Process executor: spawns the processes described by a [`Command`], wires
//! up redirections and the pipe, and waits for them or hands them to the job
//! table.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::process::{self, Child, ChildStdout, Stdio};

use log::{debug, warn};
use nix::{errno::Errno, libc};

use crate::core::{
    job::{self, ProcessId},
    parser::Command,
};
use crate::errors::{Error, ErrorKind, Result};
use crate::job_control::JobTable;
use crate::util;

const SYNTAX_ERROR_EXIT_STATUS: i32 = 2;
const REDIRECT_FAILURE_EXIT_STATUS: i32 = 1;
const COMMAND_NOT_FOUND_EXIT_STATUS: i32 = 127;

/// Outcome of running a [`Command`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecResult {
    /// The command ran in the foreground and exited with this status.
    Completed(i32),
    /// The command is running in the background under this process id.
    Backgrounded(ProcessId),
    Failed(FailureKind),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// The OS could not create a process, e.g. out of resources
    Spawn,
    /// The process was terminated by a signal instead of exiting
    Signaled(i32),
    /// Waiting on the process failed
    Wait,
}

impl ExecResult {
    /// The status a conditional tests: the exit status of a completed command
    /// and failure for anything else.
    pub fn status(&self) -> i32 {
        match *self {
            ExecResult::Completed(code) => code,
            ExecResult::Backgrounded(_) | ExecResult::Failed(_) => 1,
        }
    }

    pub fn success(&self) -> bool {
        self.status() == 0
    }
}

#[derive(Debug)]
enum Stdin {
    Inherit,
    /// Empty input, for a pipeline whose left-hand side never started
    Null,
    File(File),
    Pipe(ChildStdout),
}

#[derive(Debug)]
enum Output {
    Inherit,
    File(File),
    CreatePipe,
}

impl Stdin {
    fn open(redirect: Option<&str>) -> Result<Self> {
        match redirect {
            Some(path) => File::open(path)
                .map(Stdin::File)
                .map_err(|e| redirect_error(path, &e)),
            None => Ok(Stdin::Inherit),
        }
    }
}

impl Output {
    fn create(redirect: Option<&str>) -> Result<Self> {
        match redirect {
            Some(path) => OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)
                .map(Output::File)
                .map_err(|e| redirect_error(path, &e)),
            None => Ok(Output::Inherit),
        }
    }
}

impl From<Stdin> for Stdio {
    fn from(stdin: Stdin) -> Self {
        match stdin {
            Stdin::Inherit => Self::inherit(),
            Stdin::Null => Self::null(),
            Stdin::File(file) => file.into(),
            Stdin::Pipe(pipe) => pipe.into(),
        }
    }
}

impl From<Output> for Stdio {
    fn from(stdout: Output) -> Self {
        match stdout {
            Output::Inherit => Self::inherit(),
            Output::File(file) => file.into(),
            Output::CreatePipe => Self::piped(),
        }
    }
}

/// Runs `command`, consuming it.
///
/// Failures are reported on stderr and contained in the returned
/// [`ExecResult`]: an unopenable redirection completes with status 1, a
/// program that cannot be executed with status 127.
pub fn execute(command: Command, jobs: &mut JobTable) -> ExecResult {
    if command.program_argv.is_empty() {
        return ExecResult::Completed(0);
    }

    let result = if command.has_pipe {
        run_pipeline(command, jobs)
    } else {
        run_simple_command(command, jobs)
    };

    result.unwrap_or_else(|e| {
        report(&e);
        exec_result_for_error(&e)
    })
}

fn run_simple_command(command: Command, jobs: &mut JobTable) -> Result<ExecResult> {
    let stdin = Stdin::open(command.input_redirect.as_deref())?;
    let stdout = Output::create(command.output_redirect.as_deref())?;
    let mut child = spawn_process(&command.program_argv, stdin, stdout)?;

    if command.background {
        Ok(put_in_background(jobs, child, None, &command))
    } else {
        Ok(wait_for_child(&mut child))
    }
}

fn run_pipeline(command: Command, jobs: &mut JobTable) -> Result<ExecResult> {
    if command.pipe_argv.is_empty() {
        return Err(ErrorKind::Syntax("|".to_string()).into());
    }

    let left = Stdin::open(command.input_redirect.as_deref())
        .and_then(|stdin| spawn_process(&command.program_argv, stdin, Output::CreatePipe));
    let (mut left, right_stdin) = match left {
        Ok(mut child) => {
            let stdin = child.stdout.take().map_or(Stdin::Null, Stdin::Pipe);
            (Some(child), stdin)
        }
        Err(e) => {
            if let ErrorKind::SpawnFailure(_) = *e.kind() {
                return Err(e);
            }
            // the right-hand side still runs, reading end-of-file
            report(&e);
            (None, Stdin::Null)
        }
    };

    // The parent's copy of the read end moves into the right-hand process and
    // is closed once it is spawned, or dropped here if it never is.
    let right = Output::create(command.output_redirect.as_deref())
        .and_then(|stdout| spawn_process(&command.pipe_argv, right_stdin, stdout));
    let mut right = match right {
        Ok(child) => child,
        Err(e) => {
            if let Some(ref mut left) = left {
                wait_quietly(left);
            }
            return Err(e);
        }
    };

    if command.background {
        return Ok(put_in_background(jobs, right, left, &command));
    }

    if let Some(ref mut left) = left {
        wait_quietly(left);
    }
    Ok(wait_for_child(&mut right))
}

/// Spawns `argv` with the given standard input and output. The descriptors
/// handed in are closed in this process once the child has its own copies.
fn spawn_process(argv: &[String], stdin: Stdin, stdout: Output) -> Result<Child> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| Error::from(ErrorKind::Syntax("|".to_string())))?;

    let mut command = process::Command::new(program);
    command.args(args).stdin(stdin).stdout(stdout);
    unsafe {
        command.pre_exec(util::reset_signals);
    }
    let child = command.spawn().map_err(|e| spawn_error(program, &e))?;
    debug!("spawned {} for {:?}", child.id(), argv);
    Ok(child)
}

fn put_in_background(
    jobs: &mut JobTable,
    child: Child,
    upstream: Option<Child>,
    command: &Command,
) -> ExecResult {
    let label = command.to_string();
    let id = match upstream {
        Some(upstream) => jobs.track_pipeline(child, upstream, label),
        None => jobs.track(child, label),
    };
    ExecResult::Backgrounded(id)
}

/// Blocks until `child` terminates.
fn wait_for_child(child: &mut Child) -> ExecResult {
    match child.wait() {
        Ok(status) => match (status.code(), status.signal()) {
            (Some(code), _) => {
                debug!("{} exited with {}.", child.id(), code);
                ExecResult::Completed(code)
            }
            (None, Some(signal)) => {
                eprintln!(
                    "bsh: {} terminated by {}",
                    child.id(),
                    job::signal_name(signal)
                );
                ExecResult::Failed(FailureKind::Signaled(signal))
            }
            (None, None) => ExecResult::Failed(FailureKind::Wait),
        },
        Err(e) => {
            warn!("failed to wait for {}: {}", child.id(), e);
            eprintln!("bsh: {}", e);
            ExecResult::Failed(FailureKind::Wait)
        }
    }
}

/// Reclaims the left-hand side of a pipeline. How it ended is not reported;
/// the right-hand side speaks for the pipeline.
fn wait_quietly(child: &mut Child) {
    let temp_result = child.wait();
    log_if_err!(temp_result, "failed to wait for pipeline stage {}", child.id());
}

fn exec_result_for_error(e: &Error) -> ExecResult {
    match *e.kind() {
        ErrorKind::Syntax(_) => ExecResult::Completed(SYNTAX_ERROR_EXIT_STATUS),
        ErrorKind::RedirectOpen(..) => ExecResult::Completed(REDIRECT_FAILURE_EXIT_STATUS),
        ErrorKind::ImageReplace(..) => ExecResult::Completed(COMMAND_NOT_FOUND_EXIT_STATUS),
        _ => ExecResult::Failed(FailureKind::Spawn),
    }
}

fn report(e: &Error) {
    warn!("{}", e);
    eprintln!("bsh: {}", e);
}

fn redirect_error(path: &str, e: &io::Error) -> Error {
    ErrorKind::RedirectOpen(path.to_string(), describe_io_error(e)).into()
}

/// Resource exhaustion means no process was created; anything else means the
/// program itself could not be run.
fn spawn_error(program: &str, e: &io::Error) -> Error {
    match e.raw_os_error() {
        Some(libc::EAGAIN) | Some(libc::ENOMEM) | Some(libc::EMFILE) | Some(libc::ENFILE) => {
            ErrorKind::SpawnFailure(program.to_string()).into()
        }
        _ if e.kind() == io::ErrorKind::NotFound => {
            ErrorKind::ImageReplace(program.to_string(), "command not found".to_string()).into()
        }
        _ => ErrorKind::ImageReplace(program.to_string(), describe_io_error(e)).into(),
    }
}

fn describe_io_error(e: &io::Error) -> String {
    match e.raw_os_error() {
        Some(code) => Errno::from_i32(code).desc().to_string(),
        None => e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;
    use std::path::Path;
    use std::thread;
    use std::time::{Duration, Instant};

    use tempdir::TempDir;

    fn run(line: &str) -> ExecResult {
        execute(Command::parse(line), &mut JobTable::new())
    }

    fn path_in(dir: &TempDir, name: &str) -> String {
        dir.path().join(name).to_string_lossy().into_owned()
    }

    fn read(path: &str) -> String {
        fs::read_to_string(path).expect("read output file")
    }

    #[test]
    fn test_empty_program_is_a_no_op() {
        assert_eq!(run(""), ExecResult::Completed(0));
        assert_eq!(run("| wc"), ExecResult::Completed(0));
        assert_eq!(run("> /nonexistent/dir/file"), ExecResult::Completed(0));
    }

    #[test]
    fn test_exit_status() {
        assert_eq!(run("true"), ExecResult::Completed(0));
        assert_eq!(run("false"), ExecResult::Completed(1));
        assert_eq!(
            execute(
                Command {
                    program_argv: vec!["sh".into(), "-c".into(), "exit 3".into()],
                    ..Default::default()
                },
                &mut JobTable::new()
            ),
            ExecResult::Completed(3)
        );
    }

    #[test]
    fn test_command_not_found() {
        assert_eq!(
            run("bsh-test-no-such-program --flag"),
            ExecResult::Completed(COMMAND_NOT_FOUND_EXIT_STATUS)
        );
    }

    #[test]
    fn test_redirect_round_trip() {
        let dir = TempDir::new("bsh-exec").unwrap();
        let first = path_in(&dir, "first.txt");
        let second = path_in(&dir, "second.txt");

        assert_eq!(
            run(&format!("echo alpha beta  gamma > {}", first)),
            ExecResult::Completed(0)
        );
        assert_eq!(read(&first), "alpha beta gamma\n");

        assert_eq!(
            run(&format!("cat < {} > {}", first, second)),
            ExecResult::Completed(0)
        );
        assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
    }

    #[test]
    fn test_output_redirect_truncates() {
        let dir = TempDir::new("bsh-exec").unwrap();
        let out = path_in(&dir, "out.txt");
        fs::write(&out, "a much longer previous content\n").unwrap();
        assert_eq!(run(&format!("echo new > {}", out)), ExecResult::Completed(0));
        assert_eq!(read(&out), "new\n");
    }

    #[test]
    fn test_redirect_open_failure() {
        let dir = TempDir::new("bsh-exec").unwrap();
        let missing = path_in(&dir, "missing.txt");
        assert_eq!(
            run(&format!("cat < {}", missing)),
            ExecResult::Completed(REDIRECT_FAILURE_EXIT_STATUS)
        );

        let unwritable = path_in(&dir, "no/such/dir/out.txt");
        assert_eq!(
            run(&format!("echo hi > {}", unwritable)),
            ExecResult::Completed(REDIRECT_FAILURE_EXIT_STATUS)
        );
        assert!(!Path::new(&unwritable).exists());
    }

    #[test]
    fn test_pipeline_passes_bytes_once() {
        let dir = TempDir::new("bsh-exec").unwrap();
        let out = path_in(&dir, "out.txt");
        assert_eq!(
            run(&format!("echo hello | cat > {}", out)),
            ExecResult::Completed(0)
        );
        assert_eq!(read(&out), "hello\n");
    }

    #[test]
    fn test_pipeline_with_redirects() {
        let dir = TempDir::new("bsh-exec").unwrap();
        let input = path_in(&dir, "in.txt");
        let out = path_in(&dir, "out.txt");
        fs::write(&input, "b\na\nc\n").unwrap();
        assert_eq!(
            run(&format!("sort < {} | tr a-z A-Z > {}", input, out)),
            ExecResult::Completed(0)
        );
        assert_eq!(read(&out), "A\nB\nC\n");
    }

    #[test]
    fn test_pipeline_status_is_right_hand_side() {
        assert_eq!(run("false | true"), ExecResult::Completed(0));
        assert_eq!(run("true | false"), ExecResult::Completed(1));
    }

    #[test]
    fn test_pipeline_left_failure_runs_right_with_empty_input() {
        let dir = TempDir::new("bsh-exec").unwrap();
        let out = path_in(&dir, "out.txt");
        assert_eq!(
            run(&format!("bsh-test-no-such-program | cat > {}", out)),
            ExecResult::Completed(0)
        );
        assert_eq!(read(&out), "");

        let missing = path_in(&dir, "missing.txt");
        assert_eq!(
            run(&format!("cat < {} | wc -l > {}", missing, out)),
            ExecResult::Completed(0)
        );
        assert_eq!(read(&out).trim(), "0");
    }

    #[test]
    fn test_pipeline_right_failure() {
        assert_eq!(
            run("echo hi | bsh-test-no-such-program"),
            ExecResult::Completed(COMMAND_NOT_FOUND_EXIT_STATUS)
        );
    }

    #[test]
    fn test_pipeline_without_right_hand_side() {
        assert_eq!(run("echo hi |"), ExecResult::Completed(SYNTAX_ERROR_EXIT_STATUS));
    }

    #[test]
    fn test_left_side_closed_by_reader_exiting() {
        let start = Instant::now();
        assert_eq!(run("yes | head -n 1"), ExecResult::Completed(0));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_signaled() {
        let command = Command {
            program_argv: vec!["sh".into(), "-c".into(), "kill -9 $$".into()],
            ..Default::default()
        };
        let result = execute(command, &mut JobTable::new());
        assert_eq!(result, ExecResult::Failed(FailureKind::Signaled(9)));
        assert_eq!(result.status(), 1);
    }

    #[test]
    fn test_child_receives_default_signal_handling() {
        util::ignore_interactive_signals().unwrap();
        let command = Command {
            program_argv: vec!["sh".into(), "-c".into(), "kill -INT $$; exit 3".into()],
            ..Default::default()
        };
        let result = execute(command, &mut JobTable::new());
        assert_eq!(result, ExecResult::Failed(FailureKind::Signaled(2)));
    }

    #[test]
    fn test_background() {
        let dir = TempDir::new("bsh-exec").unwrap();
        let out = path_in(&dir, "out.txt");
        let mut jobs = JobTable::new();
        let result = execute(Command::parse(&format!("echo bg > {} &", out)), &mut jobs);
        let id = match result {
            ExecResult::Backgrounded(id) => id,
            other => panic!("expected background job, got {:?}", other),
        };
        assert!(jobs.contains(id));
        assert_eq!(result.status(), 1);

        let deadline = Instant::now() + Duration::from_secs(10);
        let mut finished = Vec::new();
        while jobs.contains(id) && Instant::now() < deadline {
            finished.extend(jobs.reap_completed());
            thread::sleep(Duration::from_millis(10));
        }
        assert!(!jobs.contains(id));
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].label, format!("echo bg > {} &", out));
        assert_eq!(read(&out), "bg\n");
    }

    #[test]
    fn test_background_pipeline_tracks_right_hand_side() {
        let dir = TempDir::new("bsh-exec").unwrap();
        let out = path_in(&dir, "out.txt");
        let mut jobs = JobTable::new();
        let result = execute(
            Command::parse(&format!("echo piped | cat > {} &", out)),
            &mut jobs,
        );
        assert!(matches!(result, ExecResult::Backgrounded(_)));
        assert_eq!(jobs.len(), 1);

        let deadline = Instant::now() + Duration::from_secs(10);
        while jobs.has_jobs() && Instant::now() < deadline {
            jobs.reap_completed();
            thread::sleep(Duration::from_millis(10));
        }
        assert!(!jobs.has_jobs());
        assert_eq!(read(&out), "piped\n");
    }

    #[test]
    fn test_spawn_error_classification() {
        let e = spawn_error("x", &io::Error::from_raw_os_error(libc::EAGAIN));
        assert_eq!(exec_result_for_error(&e), ExecResult::Failed(FailureKind::Spawn));

        let e = spawn_error("x", &io::Error::from_raw_os_error(libc::ENOENT));
        assert_eq!(e.to_string(), "x: command not found");

        let e = spawn_error("x", &io::Error::from_raw_os_error(libc::EACCES));
        assert_eq!(e.to_string(), "x: Permission denied");
        assert_eq!(
            exec_result_for_error(&e),
            ExecResult::Completed(COMMAND_NOT_FOUND_EXIT_STATUS)
        );
    }
}
