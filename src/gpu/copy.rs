//! Poll-to-completion driver shared by the transfer task variants.

use crate::api::request::RequestId;
use crate::core::buffer::ResultBuffer;
use crate::core::task::TaskStatus;
use crate::diagnostics;
use crate::gpu::traits::{FencePoll, StagingCopy, TransferError};

/// The staging copy a task is polling, if one is in flight.
///
/// Once the fence resolves the staging object is dropped on the spot so
/// its backend resources are released before the task itself goes away.
pub(crate) struct PendingCopy {
    staging: Option<Box<dyn StagingCopy>>,
}

impl PendingCopy {
    pub(crate) fn empty() -> Self {
        Self { staging: None }
    }

    pub(crate) fn install(&mut self, staging: Box<dyn StagingCopy>) {
        self.staging = Some(staging);
    }

    /// Poll the fence once. On completion, copy the mapped bytes into
    /// `result` and latch the task flags; on fence loss, latch the error.
    pub(crate) fn poll_once(
        &mut self,
        id: RequestId,
        status: &TaskStatus,
        result: &ResultBuffer,
        warn_on_truncation: bool,
    ) {
        let staging = match self.staging.as_mut() {
            Some(staging) => staging,
            None => return,
        };

        match staging.poll() {
            FencePoll::Pending => {}
            FencePoll::Signaled => {
                let copied: Result<(usize, usize), TransferError> = match staging.map() {
                    Ok(bytes) => {
                        let available = bytes.len();
                        let written = result.write(bytes);
                        Ok((available, written))
                    }
                    Err(err) => Err(err),
                };
                match copied {
                    Ok((available, written)) => {
                        staging.unmap();
                        self.staging = None;
                        if warn_on_truncation && written < available {
                            diagnostics::emit_with_context(
                                &diagnostics::RB102,
                                &format!(
                                    "request {}: {} bytes available, {} byte destination",
                                    id, available, written
                                ),
                            );
                        }
                        status.mark_done();
                    }
                    Err(err) => {
                        self.staging = None;
                        diagnostics::emit_with_context(
                            &diagnostics::RB103,
                            &format!("request {}: {}", id, err),
                        );
                        status.mark_error();
                    }
                }
            }
            FencePoll::Lost => {
                self.staging = None;
                diagnostics::emit_with_context(
                    &diagnostics::RB103,
                    &format!("request {}", id),
                );
                status.mark_error();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedCopy {
        pending_polls: u32,
        lost: bool,
        bytes: Vec<u8>,
        map_fails: bool,
    }

    impl StagingCopy for ScriptedCopy {
        fn poll(&mut self) -> FencePoll {
            if self.lost {
                return FencePoll::Lost;
            }
            if self.pending_polls > 0 {
                self.pending_polls -= 1;
                return FencePoll::Pending;
            }
            FencePoll::Signaled
        }

        fn map(&mut self) -> Result<&[u8], TransferError> {
            if self.map_fails {
                return Err(TransferError::MapFailed);
            }
            Ok(&self.bytes)
        }

        fn unmap(&mut self) {}
    }

    fn scripted(pending_polls: u32, bytes: Vec<u8>) -> Box<ScriptedCopy> {
        Box::new(ScriptedCopy {
            pending_polls,
            lost: false,
            bytes,
            map_fails: false,
        })
    }

    #[test]
    fn test_poll_until_signaled_copies_bytes() {
        let mut copy = PendingCopy::empty();
        copy.install(scripted(2, vec![1, 2, 3]));
        let status = TaskStatus::new();
        let result = ResultBuffer::unset();
        let id = RequestId::from_raw(1);

        copy.poll_once(id, &status, &result, true);
        assert!(!status.is_done());
        copy.poll_once(id, &status, &result, true);
        assert!(!status.is_done());
        copy.poll_once(id, &status, &result, true);
        assert!(status.is_done());
        assert!(!status.has_error());
        result.with_bytes(|bytes| assert_eq!(bytes, &[1, 2, 3]));
    }

    #[test]
    fn test_lost_fence_latches_error_and_drops_staging() {
        let mut copy = PendingCopy::empty();
        copy.install(Box::new(ScriptedCopy {
            pending_polls: 0,
            lost: true,
            bytes: vec![1, 2, 3],
            map_fails: false,
        }));
        let status = TaskStatus::new();
        let result = ResultBuffer::unset();

        diagnostics::suppress_diagnostics(true);
        copy.poll_once(RequestId::from_raw(2), &status, &result, true);
        diagnostics::suppress_diagnostics(false);

        assert!(status.is_done());
        assert!(status.has_error());
        assert!(copy.staging.is_none());
        assert_eq!(result.len(), 0);
    }

    #[test]
    fn test_map_failure_latches_error() {
        let mut copy = PendingCopy::empty();
        copy.install(Box::new(ScriptedCopy {
            pending_polls: 0,
            lost: false,
            bytes: vec![],
            map_fails: true,
        }));
        let status = TaskStatus::new();
        let result = ResultBuffer::unset();

        diagnostics::suppress_diagnostics(true);
        copy.poll_once(RequestId::from_raw(3), &status, &result, true);
        diagnostics::suppress_diagnostics(false);

        assert!(status.has_error());
        assert!(copy.staging.is_none());
    }

    #[test]
    fn test_poll_without_staging_is_a_no_op() {
        let mut copy = PendingCopy::empty();
        let status = TaskStatus::new();
        let result = ResultBuffer::unset();
        copy.poll_once(RequestId::from_raw(4), &status, &result, true);
        assert!(!status.is_done());
    }
}
