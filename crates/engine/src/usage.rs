// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process resource usage, limits and host identity.

use nix::sys::resource::{getrlimit, getrusage, setrlimit, Resource, Usage, UsageWho};
use nix::sys::time::TimeVal;
use sa_core::ResourceUsage;
use std::collections::BTreeMap;

/// `getrusage` for this process and for its reaped children.
pub fn resource_usage() -> ResourceUsage {
    ResourceUsage {
        own: usage_map(UsageWho::RUSAGE_SELF),
        children: usage_map(UsageWho::RUSAGE_CHILDREN),
    }
}

/// Peak resident set size of this process plus its children, in kilobytes.
pub fn peak_rss_kb() -> i64 {
    let rss = |who| getrusage(who).map(|u| i64::from(u.max_rss())).unwrap_or(0);
    rss(UsageWho::RUSAGE_SELF) + rss(UsageWho::RUSAGE_CHILDREN)
}

/// Raise the soft open-file limit to the hard limit. Returns the new limit.
pub fn raise_fd_limit() -> nix::Result<u64> {
    let (_, hard) = getrlimit(Resource::RLIMIT_NOFILE)?;
    setrlimit(Resource::RLIMIT_NOFILE, hard, hard)?;
    Ok(hard)
}

/// Host name, or an empty string when it cannot be determined.
pub fn hostname() -> String {
    match nix::unistd::gethostname() {
        Ok(name) => name.to_string_lossy().into_owned(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read host name");
            String::new()
        }
    }
}

fn usage_map(who: UsageWho) -> BTreeMap<String, i64> {
    match getrusage(who) {
        Ok(usage) => flatten(&usage),
        Err(e) => {
            tracing::warn!(error = %e, "getrusage failed");
            BTreeMap::new()
        }
    }
}

/// `ru_*` fields as integers. CPU times are in microseconds.
fn flatten(usage: &Usage) -> BTreeMap<String, i64> {
    let fields = [
        ("ru_utime", micros(usage.user_time())),
        ("ru_stime", micros(usage.system_time())),
        ("ru_maxrss", i64::from(usage.max_rss())),
        ("ru_ixrss", i64::from(usage.shared_integral())),
        ("ru_idrss", i64::from(usage.unshared_data_integral())),
        ("ru_isrss", i64::from(usage.unshared_stack_integral())),
        ("ru_minflt", i64::from(usage.minor_page_faults())),
        ("ru_majflt", i64::from(usage.major_page_faults())),
        ("ru_nswap", i64::from(usage.full_swaps())),
        ("ru_inblock", i64::from(usage.block_reads())),
        ("ru_oublock", i64::from(usage.block_writes())),
        ("ru_msgsnd", i64::from(usage.ipc_sends())),
        ("ru_msgrcv", i64::from(usage.ipc_receives())),
        ("ru_nsignals", i64::from(usage.signals())),
        ("ru_nvcsw", i64::from(usage.voluntary_context_switches())),
        ("ru_nivcsw", i64::from(usage.involuntary_context_switches())),
    ];
    fields.into_iter().map(|(name, value)| (name.to_string(), value)).collect()
}

fn micros(tv: TimeVal) -> i64 {
    i64::from(tv.tv_sec()) * 1_000_000 + i64::from(tv.tv_usec())
}

#[cfg(test)]
#[path = "usage_tests.rs"]
mod tests;
