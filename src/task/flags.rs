//! Task flags (spec.md §3, §4.3).
//!
//! Grounded on `original_source/include/xkrt/task/flag.h`: a bitfield
//! with `DEPENDENT`, `DETACHABLE`, `DEVICE`, `DOMAIN`, `MOLDABLE`. The
//! source also reserves a `CANCEL` bit and a `REQUEUE` bit; `CANCEL` is
//! carried here purely as a reserved, never-read bit (spec.md §5:
//! "reserved but unused by the core"), and `REQUEUE` is used internally
//! by the moldable-split re-entry path.

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TaskFlags: u16 {
        /// Participates in dependency resolution (component C6).
        const DEPENDENT  = 1 << 0;
        /// Completion is deferred past body return via a detach counter.
        const DETACHABLE = 1 << 1;
        /// Must execute on an accelerator device, never on the host.
        const DEVICE     = 1 << 2;
        /// Owns child dependency/coherency state (a "domain" task).
        const DOMAIN     = 1 << 3;
        /// May be recursively split before `DATA_FETCHING`.
        const MOLDABLE   = 1 << 4;
        /// Reserved; never read by the core (spec.md §5).
        const CANCEL     = 1 << 5;
        /// Internal: re-queued after its body returns (moldable split
        /// re-entry).
        const REQUEUE    = 1 << 7;
    }
}

impl TaskFlags {
    /// `DOMAIN` and `DEVICE` are mutually exclusive per spec.md §3
    /// ("Invariants of a task record").
    pub fn is_valid(self) -> bool {
        !(self.contains(TaskFlags::DOMAIN) && self.contains(TaskFlags::DEVICE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_and_device_are_mutually_exclusive() {
        let bad = TaskFlags::DOMAIN | TaskFlags::DEVICE;
        assert!(!bad.is_valid());
        assert!((TaskFlags::DOMAIN).is_valid());
        assert!((TaskFlags::DEVICE).is_valid());
    }
}
