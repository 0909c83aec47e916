//! Executor CPU pinning
//!
//! Executors can be bound to cores so that their measurements are not skewed
//! by migrations. The core for executor `i` is `cores[i % cores.len()]`.
//!
//! # Platform Support
//!
//! Pinning uses `sched_setaffinity` and is only available on Linux; elsewhere
//! it returns an error.

use crate::Result;
use anyhow::Context;

/// Largest core id representable in a `cpu_set_t`
const MAX_CORE_ID: usize = 1023;

/// Core assigned to executor `worker_id`, if pinning is configured
pub fn core_for_worker(cores: &[usize], worker_id: usize) -> Option<usize> {
    if cores.is_empty() {
        None
    } else {
        Some(cores[worker_id % cores.len()])
    }
}

/// Pin the calling thread to `core`
#[cfg(target_os = "linux")]
pub fn pin_current_thread(core: usize) -> Result<()> {
    use libc::{cpu_set_t, sched_setaffinity, CPU_SET, CPU_ZERO};
    use std::mem;

    if core > MAX_CORE_ID {
        anyhow::bail!("CPU core ID {} is too large (max {})", core, MAX_CORE_ID);
    }

    // SAFETY: cpu_set_t is plain data, zeroed is a valid empty set
    let result = unsafe {
        let mut cpu_set: cpu_set_t = mem::zeroed();
        CPU_ZERO(&mut cpu_set);
        CPU_SET(core, &mut cpu_set);
        sched_setaffinity(0, mem::size_of::<cpu_set_t>(), &cpu_set)
    };

    if result != 0 {
        return Err(std::io::Error::last_os_error())
            .with_context(|| format!("Failed to pin thread to core {}", core));
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
pub fn pin_current_thread(_core: usize) -> Result<()> {
    anyhow::bail!("CPU pinning is only supported on Linux")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_assignment_wraps() {
        let cores = [2, 4, 6];
        assert_eq!(core_for_worker(&cores, 0), Some(2));
        assert_eq!(core_for_worker(&cores, 4), Some(4));
        assert_eq!(core_for_worker(&[], 3), None);
    }

    #[test]
    fn test_core_id_too_large() {
        assert!(pin_current_thread(MAX_CORE_ID + 1).is_err());
    }
}
