//! Process containment for rubric scripts.
//!
//! On unix every script leads its own process group and starts under the
//! memory, process and CPU ceilings from [`ExecutionLimits`]. When the script
//! returns or times out the whole group is killed, so background children
//! cannot outlive the test case or keep its pipes open.

use tokio::process::Command;
use util::execution_limits::ExecutionLimits;

#[cfg(unix)]
pub fn confine(cmd: &mut Command, limits: &ExecutionLimits) {
    let ceilings = [
        (nix::sys::resource::Resource::RLIMIT_AS, limits.max_memory),
        (nix::sys::resource::Resource::RLIMIT_NPROC, limits.max_processes),
        (nix::sys::resource::Resource::RLIMIT_CPU, limits.max_cpu_secs),
    ];

    cmd.process_group(0);
    // Only raw syscalls run between fork and exec.
    unsafe {
        cmd.pre_exec(move || apply_rlimits(&ceilings));
    }
}

#[cfg(not(unix))]
pub fn confine(_cmd: &mut Command, _limits: &ExecutionLimits) {}

/// Lowers each soft and hard limit to `value`, never above the current hard
/// limit. Zero leaves the resource alone.
#[cfg(unix)]
fn apply_rlimits(ceilings: &[(nix::sys::resource::Resource, u64)]) -> std::io::Result<()> {
    use nix::sys::resource::{getrlimit, setrlimit};

    for &(resource, value) in ceilings {
        if value == 0 {
            continue;
        }
        let (_, hard) = getrlimit(resource)?;
        let value = value.min(hard as u64) as _;
        setrlimit(resource, value, value)?;
    }
    Ok(())
}

/// SIGKILLs every process left in the group led by `pid`.
#[cfg(unix)]
pub fn kill_group(pid: Option<u32>) {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Some(pid) = pid else {
        return;
    };
    match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(err) => tracing::warn!("Failed to kill process group {pid}: {err}"),
    }
}

#[cfg(not(unix))]
pub fn kill_group(_pid: Option<u32>) {}
