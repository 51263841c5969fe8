//! Request statistics.

/// Aggregated readback statistics.
///
/// A point-in-time snapshot; counters are cumulative since the service
/// was created.
#[derive(Debug, Clone, Default)]
pub struct ReadbackStats {
    /// Total requests created.
    pub created: u64,

    /// Requests that finished successfully.
    pub completed: u64,

    /// Requests that failed at kickoff or in flight.
    pub failed: u64,

    /// Requests erased after their grace cycle.
    pub disposed: u64,

    /// Result bytes copied out of staging memory.
    pub bytes_copied: u64,

    /// Requests currently in the table, including finished ones awaiting
    /// disposal.
    pub in_flight: usize,

    /// Requests queued for erasure on the next update.
    pub pending_release: usize,

    /// Most requests ever in the table at once (high water mark).
    pub peak_in_flight: usize,
}

impl ReadbackStats {
    /// Create empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests still waiting on the GPU.
    pub fn in_progress(&self) -> u64 {
        self.created
            .saturating_sub(self.completed)
            .saturating_sub(self.failed)
    }
}

impl std::fmt::Display for ReadbackStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Readback Statistics:")?;
        writeln!(f, "  Created:         {}", self.created)?;
        writeln!(f, "  Completed:       {}", self.completed)?;
        writeln!(f, "  Failed:          {}", self.failed)?;
        writeln!(f, "  Disposed:        {}", self.disposed)?;
        writeln!(f, "  In progress:     {}", self.in_progress())?;
        writeln!(f, "  Bytes copied:    {}", self.bytes_copied)?;
        writeln!(f, "  In flight:       {}", self.in_flight)?;
        writeln!(f, "  Pending release: {}", self.pending_release)?;
        writeln!(f, "  Peak in flight:  {}", self.peak_in_flight)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_progress_derivation() {
        let stats = ReadbackStats {
            created: 10,
            completed: 6,
            failed: 1,
            ..Default::default()
        };
        assert_eq!(stats.in_progress(), 3);
    }

    #[test]
    fn test_display_includes_counters() {
        let stats = ReadbackStats {
            created: 3,
            bytes_copied: 192,
            ..Default::default()
        };
        let text = stats.to_string();
        assert!(text.contains("Created:         3"));
        assert!(text.contains("Bytes copied:    192"));
    }
}
